use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FrameType {
    #[default]
    Unknown,
    I,
    P,
    B,
}

/// Everything extracted for one decoded access unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecord {
    /// Zero-based index among the records returned by the session.
    pub frame_idx: u64,
    /// Presentation timestamp in seconds.
    pub pts: f64,
    /// Decoding timestamp in seconds.
    pub dts: f64,
    /// Size of the compressed data in bytes.
    pub size: usize,
    pub frame_type: FrameType,
    #[serde(rename = "is_idr")]
    pub is_key_frame: bool,
    /// Metrics from the decoder's side channel, when it supplied them.
    #[serde(flatten)]
    pub aux: Option<AuxMetrics>,
}

impl FrameRecord {
    #[must_use]
    pub const fn new(frame_idx: u64, frame_type: FrameType, is_key_frame: bool) -> Self {
        Self {
            frame_idx,
            pts: 0.0,
            dts: 0.0,
            size: 0,
            frame_type,
            is_key_frame,
            aux: None,
        }
    }
}

/// Per-frame statistics computed inside the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AuxMetrics {
    #[serde(flatten)]
    pub qp: QpStats,
    #[serde(flatten)]
    pub motion: MotionStats,
    /// Picture order count of this frame.
    pub current_poc: i32,
    /// Difference to the previous frame's picture order count.
    pub poc_diff: i32,
    /// Number of macroblocks carrying motion vectors.
    pub mb_mv_count: i32,
    /// Number of coded motion vectors.
    pub mv_coded_count: i32,
    /// Bits spent on coding motion.
    pub motion_bit_count: u32,
    /// Bits spent on coding residual coefficients.
    pub coefs_bit_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct QpStats {
    #[serde(rename = "qp_min")]
    pub min: u32,
    #[serde(rename = "qp_max")]
    pub max: u32,
    /// QP signalled in the slice or frame header.
    #[serde(rename = "qp_init")]
    pub init: u32,
    #[serde(rename = "qp_avg")]
    pub avg: f64,
    #[serde(rename = "qp_stdev")]
    pub stdev: f64,
    /// Average QP with the black border excluded.
    #[serde(rename = "qp_bb_avg")]
    pub bb_avg: f64,
    #[serde(rename = "qp_bb_stdev")]
    pub bb_stdev: f64,
}

/// Motion vector statistics. Lengths are in sub-pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MotionStats {
    #[serde(rename = "motion_avg")]
    pub avg: f64,
    #[serde(rename = "motion_stdev")]
    pub stdev: f64,
    #[serde(rename = "motion_x_avg")]
    pub x_avg: f64,
    #[serde(rename = "motion_x_stdev")]
    pub x_stdev: f64,
    #[serde(rename = "motion_y_avg")]
    pub y_avg: f64,
    #[serde(rename = "motion_y_stdev")]
    pub y_stdev: f64,
    /// Difference between the motion and its prediction.
    #[serde(rename = "motion_diff_avg")]
    pub diff_avg: f64,
    #[serde(rename = "motion_diff_stdev")]
    pub diff_stdev: f64,
}
