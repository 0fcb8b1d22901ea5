//! 均勻取樣規劃器
//!
//! 不分析內容，只依影片長度把片段起點平均分散在整條時間軸上。

use super::backend::TimeRange;
use super::diagnostics::{Diagnostics, Warning};
use crate::error::{SummaryError, SummaryResult};
use log::{debug, info};

/// 片段間距下限（秒）
pub const MIN_INTERVAL_SECONDS: f64 = 1.0;

/// 取樣計畫
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingPlan {
    ranges: Vec<TimeRange>,
    requested_count: usize,
    effective_count: usize,
    segment_duration: f64,
    interval: f64,
}

impl SamplingPlan {
    #[must_use]
    pub fn ranges(&self) -> &[TimeRange] {
        &self.ranges
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    #[must_use]
    pub const fn requested_count(&self) -> usize {
        self.requested_count
    }

    /// 縮減後的片段數量（可能大於實際區段數，見 [`Warning::RangeOutOfBounds`]）
    #[must_use]
    pub const fn effective_count(&self) -> usize {
        self.effective_count
    }

    #[must_use]
    pub const fn segment_duration(&self) -> f64 {
        self.segment_duration
    }

    /// 起點間距；空計畫為 0
    #[must_use]
    pub const fn interval(&self) -> f64 {
        self.interval
    }
}

fn ensure_positive(name: &str, value: f64) -> SummaryResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SummaryError::invalid_input(format!(
            "{name} 必須大於 0（目前為 {value}）"
        )))
    }
}

/// 建立取樣計畫
///
/// 1. 影片長度不足 `requested_count * segment_duration` 時，
///    片段數量縮減為 `floor(duration / segment_duration)`
/// 2. 間距 `interval = max(1.0, duration / count)`
/// 3. 第 i 個區段為 `[i * interval, min(i * interval + segment_duration, duration)]`
///
/// 當間距小於片段長度時區段會重疊，這是均勻分布的結果，不做修正。
pub fn plan(
    duration_seconds: f64,
    requested_count: usize,
    segment_duration: f64,
    diagnostics: &mut Diagnostics,
) -> SummaryResult<SamplingPlan> {
    ensure_positive("影片長度", duration_seconds)?;
    ensure_positive("片段長度", segment_duration)?;
    if requested_count == 0 {
        return Err(SummaryError::invalid_input("片段數量必須大於 0"));
    }

    let required_total = requested_count as f64 * segment_duration;
    let effective_count = if duration_seconds < required_total {
        let reduced = (duration_seconds / segment_duration).floor() as usize;
        diagnostics.push(Warning::PlanReduced {
            requested: requested_count,
            effective: reduced,
        });
        reduced
    } else {
        requested_count
    };

    if effective_count == 0 {
        return Ok(SamplingPlan {
            ranges: Vec::new(),
            requested_count,
            effective_count,
            segment_duration,
            interval: 0.0,
        });
    }

    let interval = MIN_INTERVAL_SECONDS.max(duration_seconds / effective_count as f64);

    // 起點遞增，超出影片長度後的區段全部略過
    let in_bounds = ((duration_seconds / interval).ceil() as usize).min(effective_count);
    let mut ranges = Vec::with_capacity(in_bounds);
    for i in 0..effective_count {
        let start = i as f64 * interval;

        // 只有在間距被 1 秒下限撐大時才會發生
        if start >= duration_seconds {
            diagnostics.push(Warning::RangeOutOfBounds {
                first_index: i,
                dropped: effective_count - i,
            });
            break;
        }

        let end = (start + segment_duration).min(duration_seconds);
        let range = TimeRange::within(start, end, duration_seconds)?;
        debug!("片段 {i}: {range}");
        ranges.push(range);
    }

    info!(
        "取樣計畫: {} 個片段，間距 {interval:.3}s，每段 {segment_duration:.3}s（影片長度 {duration_seconds:.3}s）",
        ranges.len()
    );

    Ok(SamplingPlan {
        ranges,
        requested_count,
        effective_count,
        segment_duration,
        interval,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts(plan: &SamplingPlan) -> Vec<f64> {
        plan.ranges().iter().map(TimeRange::start).collect()
    }

    #[test]
    fn test_plan_without_reduction() {
        let mut diagnostics = Diagnostics::new();
        let plan = plan(100.0, 5, 3.0, &mut diagnostics).unwrap();

        assert_eq!(plan.len(), 5);
        assert_eq!(starts(&plan), vec![0.0, 20.0, 40.0, 60.0, 80.0]);
        for range in plan.ranges() {
            assert!((range.duration() - 3.0).abs() < 1e-9);
        }
        assert!(diagnostics.plan_reduction().is_none());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_plan_reduced_for_short_video() {
        let mut diagnostics = Diagnostics::new();
        let plan = plan(10.0, 10, 3.0, &mut diagnostics).unwrap();

        assert_eq!(plan.requested_count(), 10);
        assert_eq!(plan.effective_count(), 3);
        assert_eq!(plan.len(), 3);
        assert_eq!(diagnostics.plan_reduction(), Some((10, 3)));

        let expected = [0.0, 10.0 / 3.0, 20.0 / 3.0];
        for (range, want) in plan.ranges().iter().zip(expected) {
            assert!((range.start() - want).abs() < 1e-9);
            assert!(range.end() <= 10.0);
        }
        // 6.67 + 3 = 9.67，仍在影片範圍內
        assert!((plan.ranges()[2].end() - (20.0 / 3.0 + 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_plan_empty_when_segment_longer_than_video() {
        let mut diagnostics = Diagnostics::new();
        let plan = plan(2.0, 4, 5.0, &mut diagnostics).unwrap();

        assert!(plan.is_empty());
        assert_eq!(plan.effective_count(), 0);
        assert_eq!(diagnostics.plan_reduction(), Some((4, 0)));
    }

    #[test]
    fn test_plan_clamps_tail_segment() {
        let mut diagnostics = Diagnostics::new();
        // 2.2 / 4 = 0.55 → 間距為 1 秒，第三段 2.0 + 0.5 超出影片長度
        let plan = plan(2.2, 4, 0.5, &mut diagnostics).unwrap();

        assert_eq!(starts(&plan), vec![0.0, 1.0, 2.0]);
        let tail = plan.ranges()[2];
        assert!((tail.end() - 2.2).abs() < 1e-9);
        assert!(tail.duration() < plan.segment_duration());
    }

    #[test]
    fn test_plan_back_to_back_segments() {
        let mut diagnostics = Diagnostics::new();
        let plan = plan(100.0, 5, 20.0, &mut diagnostics).unwrap();

        assert_eq!(plan.len(), 5);
        for pair in plan.ranges().windows(2) {
            assert!((pair[0].end() - pair[1].start()).abs() < 1e-9);
        }
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_interval_floor_drops_out_of_range_segments() {
        let mut diagnostics = Diagnostics::new();
        // 2.5 / 5 = 0.5 → 間距被撐到 1 秒，起點 3 與 4 已超過影片長度
        let plan = plan(2.5, 5, 0.5, &mut diagnostics).unwrap();

        assert!((plan.interval() - 1.0).abs() < f64::EPSILON);
        assert_eq!(starts(&plan), vec![0.0, 1.0, 2.0]);
        assert_eq!(
            diagnostics.warnings(),
            &[Warning::RangeOutOfBounds {
                first_index: 3,
                dropped: 2,
            }]
        );
    }

    #[test]
    fn test_huge_segment_count_reports_one_out_of_range_warning() {
        let mut diagnostics = Diagnostics::new();
        let plan = plan(10.0, 2_000_000, 0.000_001, &mut diagnostics).unwrap();

        assert_eq!(plan.requested_count(), 2_000_000);
        assert_eq!(plan.effective_count(), 2_000_000);
        assert_eq!(plan.len(), 10);
        assert_eq!(
            diagnostics.warnings(),
            &[Warning::RangeOutOfBounds {
                first_index: 10,
                dropped: 1_999_990,
            }]
        );
    }

    #[test]
    fn test_plan_ranges_are_valid_and_ordered() {
        let cases = [
            (100.0, 5, 3.0),
            (10.0, 10, 3.0),
            (7.3, 3, 2.2),
            (3600.0, 54, 1.5),
            (0.9, 1, 0.3),
            (12.0, 7, 0.25),
        ];

        for (duration, count, segment) in cases {
            let mut diagnostics = Diagnostics::new();
            let plan = plan(duration, count, segment, &mut diagnostics).unwrap();

            for range in plan.ranges() {
                assert!(range.start() >= 0.0);
                assert!(range.start() < range.end());
                assert!(range.end() <= duration);
            }
            for pair in plan.ranges().windows(2) {
                assert!(pair[0].start() < pair[1].start());
            }
            for (i, range) in plan.ranges().iter().enumerate() {
                assert!((range.start() - i as f64 * plan.interval()).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_plan_rejects_invalid_input() {
        let mut diagnostics = Diagnostics::new();
        assert!(matches!(
            plan(0.0, 5, 3.0, &mut diagnostics),
            Err(SummaryError::InvalidInput(_))
        ));
        assert!(matches!(
            plan(100.0, 0, 3.0, &mut diagnostics),
            Err(SummaryError::InvalidInput(_))
        ));
        assert!(matches!(
            plan(100.0, 5, -1.0, &mut diagnostics),
            Err(SummaryError::InvalidInput(_))
        ));
        assert!(matches!(
            plan(f64::INFINITY, 5, 3.0, &mut diagnostics),
            Err(SummaryError::InvalidInput(_))
        ));
        assert!(diagnostics.is_empty());
    }
}
