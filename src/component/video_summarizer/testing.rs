//! 單元測試用的記憶體後端

use super::backend::{
    AudioHandle, ClipHandle, EncodeOptions, MediaBackend, MediaHandle, SourceProfile, TimeRange,
};
use anyhow::{Result, bail};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Resource {
    duration: f64,
    slice_start: Option<f64>,
    has_audio: bool,
}

#[derive(Debug, Clone)]
pub struct EncodedOutput {
    pub path: PathBuf,
    pub duration: f64,
    pub has_audio: bool,
    pub options: EncodeOptions,
}

#[derive(Debug, Default)]
struct State {
    live: HashMap<Uuid, Resource>,
    rescale_targets: Vec<f64>,
    concat_inputs: Vec<Vec<Option<f64>>>,
    encoded: Vec<EncodedOutput>,
    released: usize,
    unknown_releases: usize,
}

#[derive(Debug)]
pub struct FakeBackend {
    duration: f64,
    has_audio: bool,
    failing_slices: Vec<f64>,
    fail_rescale: bool,
    fail_concat: bool,
    fail_trim: bool,
    fail_attach: bool,
    fail_encode: bool,
    state: Mutex<State>,
}

impl FakeBackend {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            has_audio: true,
            failing_slices: Vec::new(),
            fail_rescale: false,
            fail_concat: false,
            fail_trim: false,
            fail_attach: false,
            fail_encode: false,
            state: Mutex::new(State::default()),
        }
    }

    pub fn without_audio(mut self) -> Self {
        self.has_audio = false;
        self
    }

    pub fn fail_slices_at(mut self, starts: &[f64]) -> Self {
        self.failing_slices = starts.to_vec();
        self
    }

    pub fn fail_rescale(mut self) -> Self {
        self.fail_rescale = true;
        self
    }

    pub fn fail_concat(mut self) -> Self {
        self.fail_concat = true;
        self
    }

    pub fn fail_trim(mut self) -> Self {
        self.fail_trim = true;
        self
    }

    pub fn fail_attach(mut self) -> Self {
        self.fail_attach = true;
        self
    }

    pub fn fail_encode(mut self) -> Self {
        self.fail_encode = true;
        self
    }

    pub fn profile(&self) -> SourceProfile {
        SourceProfile::new(
            Path::new("/videos/source.mp4"),
            self.duration,
            30.0,
            640,
            360,
            self.has_audio,
        )
        .unwrap()
    }

    /// 建立一個與後端無關的片段（模擬外部擷取）
    pub fn make_clip(&self, start: f64, duration: f64) -> ClipHandle {
        let clip = ClipHandle::new(duration);
        self.register(clip.id(), duration, Some(start), false);
        clip
    }

    pub fn slice_start(&self, clip: &ClipHandle) -> f64 {
        self.state.lock().unwrap().live[&clip.id()]
            .slice_start
            .unwrap()
    }

    pub fn live_handles(&self) -> usize {
        self.state.lock().unwrap().live.len()
    }

    pub fn released(&self) -> usize {
        self.state.lock().unwrap().released
    }

    pub fn unknown_releases(&self) -> usize {
        self.state.lock().unwrap().unknown_releases
    }

    pub fn rescale_targets(&self) -> Vec<f64> {
        self.state.lock().unwrap().rescale_targets.clone()
    }

    /// 每次 concatenate 的輸入（以原始區段起點表示）
    pub fn concat_inputs(&self) -> Vec<Vec<Option<f64>>> {
        self.state.lock().unwrap().concat_inputs.clone()
    }

    pub fn encoded(&self) -> Vec<EncodedOutput> {
        self.state.lock().unwrap().encoded.clone()
    }

    fn register(&self, id: Uuid, duration: f64, slice_start: Option<f64>, has_audio: bool) {
        self.state.lock().unwrap().live.insert(
            id,
            Resource {
                duration,
                slice_start,
                has_audio,
            },
        );
    }

    fn lookup(&self, id: Uuid) -> Result<Resource> {
        match self.state.lock().unwrap().live.get(&id) {
            Some(resource) => Ok(resource.clone()),
            None => bail!("handle {id} 不存在或已釋放"),
        }
    }
}

impl MediaBackend for FakeBackend {
    fn open(&self, _path: &Path) -> Result<SourceProfile> {
        Ok(self.profile())
    }

    fn slice(&self, _profile: &SourceProfile, range: TimeRange) -> Result<ClipHandle> {
        if self
            .failing_slices
            .iter()
            .any(|start| (start - range.start()).abs() < 1e-9)
        {
            bail!("無法解碼 {range}");
        }
        Ok(self.make_clip(range.start(), range.duration()))
    }

    fn rescale(&self, clip: &ClipHandle, new_duration: f64) -> Result<ClipHandle> {
        let source = self.lookup(clip.id())?;
        if self.fail_rescale {
            bail!("rescale 失敗");
        }
        self.state.lock().unwrap().rescale_targets.push(new_duration);

        let rescaled = ClipHandle::new(new_duration);
        self.register(rescaled.id(), new_duration, source.slice_start, false);
        Ok(rescaled)
    }

    fn concatenate(&self, clips: &[&ClipHandle]) -> Result<ClipHandle> {
        let mut total = 0.0;
        let mut starts = Vec::with_capacity(clips.len());
        for clip in clips {
            let resource = self.lookup(clip.id())?;
            total += resource.duration;
            starts.push(resource.slice_start);
        }
        if self.fail_concat {
            bail!("concatenate 失敗");
        }
        self.state.lock().unwrap().concat_inputs.push(starts);

        let combined = ClipHandle::new(total);
        self.register(combined.id(), total, None, false);
        Ok(combined)
    }

    fn trim_audio(&self, profile: &SourceProfile, range: TimeRange) -> Result<Option<AudioHandle>> {
        if !profile.has_audio() {
            return Ok(None);
        }
        if self.fail_trim {
            bail!("音訊解碼失敗");
        }
        let audio = AudioHandle::new(range.duration());
        self.register(audio.id(), range.duration(), None, true);
        Ok(Some(audio))
    }

    fn attach_audio(&self, clip: &ClipHandle, audio: &AudioHandle) -> Result<ClipHandle> {
        let video = self.lookup(clip.id())?;
        self.lookup(audio.id())?;
        if self.fail_attach {
            bail!("音軌長度與影片不符");
        }

        let attached = ClipHandle::new(video.duration);
        self.register(attached.id(), video.duration, None, true);
        Ok(attached)
    }

    fn encode(&self, clip: &ClipHandle, output_path: &Path, options: &EncodeOptions) -> Result<()> {
        let resource = self.lookup(clip.id())?;
        if self.fail_encode {
            bail!("encoder 中斷");
        }
        self.state.lock().unwrap().encoded.push(EncodedOutput {
            path: output_path.to_path_buf(),
            duration: resource.duration,
            has_audio: resource.has_audio,
            options: options.clone(),
        });
        Ok(())
    }

    fn release(&self, handle: MediaHandle) {
        let mut state = self.state.lock().unwrap();
        if state.live.remove(&handle.id()).is_some() {
            state.released += 1;
        } else {
            state.unknown_releases += 1;
        }
    }
}
