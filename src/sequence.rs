use serde::Serialize;

use crate::options::BitratePolicy;

/// Sequence-wide description of the parsed video stream.
///
/// `duration`, `frame_count` and `bitrate` are provisional until
/// [`SequenceStats::finalize`] has seen the parsed frames, since containers
/// regularly leave them at zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SequenceInfo {
    /// Canonical short codec name, e.g. `h264` or `av1`.
    #[serde(rename = "video_codec")]
    pub codec: String,
    /// Bitrate in kbit/s.
    #[serde(rename = "video_bitrate")]
    pub bitrate: f64,
    #[serde(rename = "video_framerate")]
    pub framerate: f64,
    #[serde(rename = "video_width")]
    pub width: u32,
    #[serde(rename = "video_height")]
    pub height: u32,
    #[serde(rename = "video_codec_profile")]
    pub profile: i32,
    #[serde(rename = "video_codec_level")]
    pub level: i32,
    #[serde(rename = "video_bit_depth")]
    pub bit_depth: u32,
    #[serde(rename = "video_pix_fmt")]
    pub pix_fmt: String,
    /// Duration in seconds.
    #[serde(rename = "video_duration")]
    pub duration: f64,
    #[serde(rename = "video_frame_count")]
    pub frame_count: u64,
}

/// The container/stream metadata plus what the session learned from the
/// frames it actually parsed.
#[derive(Debug, Clone, Default)]
pub struct SequenceStats {
    provisional: SequenceInfo,
    first_pts: Option<f64>,
    last_pts: f64,
    packet_size_sum: u64,
    frames_parsed: u64,
}

impl SequenceStats {
    #[must_use]
    pub const fn new(provisional: SequenceInfo) -> Self {
        Self {
            provisional,
            first_pts: None,
            last_pts: 0.0,
            packet_size_sum: 0,
            frames_parsed: 0,
        }
    }

    /// Accounts one successfully extracted frame.
    pub fn record_frame(&mut self, pts: f64, size: usize) {
        self.first_pts.get_or_insert(pts);
        self.last_pts = pts;
        self.packet_size_sum += size as u64;
        self.frames_parsed += 1;
    }

    /// Number of frames accounted so far, which is also the index the next
    /// frame will get.
    #[must_use]
    pub const fn frames_parsed(&self) -> u64 {
        self.frames_parsed
    }

    #[must_use]
    pub const fn packet_size_sum(&self) -> u64 {
        self.packet_size_sum
    }

    #[must_use]
    pub const fn provisional(&self) -> &SequenceInfo {
        &self.provisional
    }

    pub const fn provisional_mut(&mut self) -> &mut SequenceInfo {
        &mut self.provisional
    }

    /// Derives the final sequence values from the accumulated frames.
    ///
    /// Duration and frame count reported by the container are kept when
    /// nonzero; otherwise they come from the timestamps and the number of
    /// parsed frames. The bitrate is recomputed from the summed frame sizes
    /// whenever a frame was parsed and the duration is nonzero, unless
    /// `policy` prefers a nonzero container value.
    #[must_use]
    pub fn finalize(&self, policy: BitratePolicy) -> SequenceInfo {
        let mut info = self.provisional.clone();
        let Some(first_pts) = self.first_pts else {
            return info;
        };

        if info.duration == 0.0 {
            info.duration = self.last_pts - first_pts;
        }
        if info.frame_count == 0 {
            info.frame_count = self.frames_parsed;
        }

        let keep_container =
            policy == BitratePolicy::PreferContainer && info.bitrate > 0.0;
        if !keep_container && info.duration > 0.0 {
            info.bitrate = bitrate_kbps(self.packet_size_sum, info.duration);
        }

        info
    }
}

/// Bitrate in kbit/s for `bytes` spread over `duration` seconds.
#[must_use]
pub fn bitrate_kbps(bytes: u64, duration: f64) -> f64 {
    bytes as f64 * 8.0 / 1000.0 / duration
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    fn container(duration: f64, frame_count: u64, bitrate: f64) -> SequenceInfo {
        SequenceInfo {
            codec: "h264".to_owned(),
            bitrate,
            framerate: 25.0,
            width: 1920,
            height: 1080,
            duration,
            frame_count,
            ..SequenceInfo::default()
        }
    }

    #[test]
    fn nothing_parsed_keeps_provisional_values() {
        let provisional = container(0.0, 0, 0.0);
        let stats = SequenceStats::new(provisional.clone());
        assert_eq!(stats.finalize(BitratePolicy::Recompute), provisional);
        assert_eq!(stats.finalize(BitratePolicy::Recompute), provisional);
    }

    #[test]
    fn derives_duration_and_count_when_container_is_silent() {
        let mut stats = SequenceStats::new(container(0.0, 0, 0.0));
        for i in 0..5 {
            stats.record_frame(f64::from(i) * 0.5, 1000);
        }
        let info = stats.finalize(BitratePolicy::Recompute);
        assert!((info.duration - 2.0).abs() < f64::EPSILON);
        assert_eq!(info.frame_count, 5);
        assert!((info.bitrate - 20.0).abs() < 1e-9);
    }

    #[test]
    fn keeps_container_duration_and_count() {
        let mut stats = SequenceStats::new(container(10.0, 250, 500.0));
        stats.record_frame(0.0, 100);
        stats.record_frame(0.04, 100);
        let info = stats.finalize(BitratePolicy::Recompute);
        assert!((info.duration - 10.0).abs() < f64::EPSILON);
        assert_eq!(info.frame_count, 250);
    }

    #[test]
    fn bitrate_from_frame_sizes() {
        let mut stats = SequenceStats::new(container(0.0, 0, 0.0));
        stats.record_frame(0.0, 62_500);
        stats.record_frame(1.0, 62_500);
        assert_eq!(stats.packet_size_sum(), 125_000);
        let info = stats.finalize(BitratePolicy::Recompute);
        assert!((info.bitrate - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn recomputed_bitrate_overrides_container() {
        let mut stats = SequenceStats::new(container(1.0, 0, 4000.0));
        stats.record_frame(0.0, 125_000);
        let info = stats.finalize(BitratePolicy::Recompute);
        assert!((info.bitrate - 1000.0).abs() < 1e-9);

        let info = stats.finalize(BitratePolicy::PreferContainer);
        assert!((info.bitrate - 4000.0).abs() < 1e-9);
    }

    #[test]
    fn zero_duration_leaves_bitrate_alone() {
        let mut stats = SequenceStats::new(container(0.0, 0, 300.0));
        stats.record_frame(3.0, 5000);
        let info = stats.finalize(BitratePolicy::Recompute);
        assert!(info.duration.abs() < f64::EPSILON);
        assert_eq!(info.frame_count, 1);
        assert!((info.bitrate - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn first_pts_is_set_once() {
        let mut stats = SequenceStats::new(SequenceInfo::default());
        stats.record_frame(1.0, 1);
        stats.record_frame(4.0, 1);
        stats.record_frame(3.0, 1);
        let info = stats.finalize(BitratePolicy::Recompute);
        assert!((info.duration - 2.0).abs() < f64::EPSILON);
    }

    #[quickcheck]
    fn bitrate_matches_formula(sizes: Vec<u16>, frame_duration_ms: u16) -> bool {
        if sizes.len() < 2 || frame_duration_ms == 0 {
            return true;
        }
        let step = f64::from(frame_duration_ms) / 1000.0;
        let mut stats = SequenceStats::new(SequenceInfo::default());
        for (i, size) in sizes.iter().enumerate() {
            stats.record_frame(i as f64 * step, usize::from(*size));
        }
        let total: u64 = sizes.iter().map(|&s| u64::from(s)).sum();
        let duration = (sizes.len() - 1) as f64 * step;
        let info = stats.finalize(BitratePolicy::Recompute);
        info.frame_count == sizes.len() as u64
            && (info.bitrate - total as f64 * 8.0 / 1000.0 / duration).abs() < 1e-6
    }
}
