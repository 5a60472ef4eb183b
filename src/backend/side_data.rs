use std::{mem::size_of, ptr};

use ffmpeg::frame;

use crate::frame::{AuxMetrics, MotionStats, QpStats};

/// Per-frame statistics block written by the instrumented decoders.
///
/// The decoder attaches it to each output frame as the `opaque_ref` buffer;
/// stock decoders leave that buffer unset. The layout must match the C
/// definition field for field.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedFrameInfo {
    pub frame_idx: i32,

    // Running sums the decoder keeps while walking the blocks.
    pub qp_sum: u32,
    pub qp_sum_sqr: u32,
    pub qp_cnt: u32,
    pub qp_sum_bb: u32,
    pub qp_sum_sqr_bb: u32,
    pub qp_cnt_bb: u32,

    pub mv_length: f64,
    pub mv_sum_sqr: f64,
    pub mv_x_length: f64,
    pub mv_y_length: f64,
    pub mv_x_sum_sqr: f64,
    pub mv_y_sum_sqr: f64,
    pub mv_length_diff: f64,

    pub mv_diff_sum: f64,
    pub mv_diff_sum_sqr: f64,

    // Derived values exported per frame.
    pub qp_min: u32,
    pub qp_max: u32,
    pub qp_init: u32,
    pub qp_avg: f64,
    pub qp_stdev: f64,
    pub qp_bb_avg: f64,
    pub qp_bb_stdev: f64,

    pub motion_avg: f64,
    pub motion_stdev: f64,
    pub motion_x_avg: f64,
    pub motion_y_avg: f64,
    pub motion_x_stdev: f64,
    pub motion_y_stdev: f64,
    pub motion_diff_avg: f64,
    pub motion_diff_stdev: f64,
    pub current_poc: i32,
    pub poc_diff: i32,
    pub motion_bit_count: u32,
    pub coefs_bit_count: u32,

    pub mb_mv_count: i32,
    pub mv_coded_count: i32,
}

impl From<SharedFrameInfo> for AuxMetrics {
    fn from(info: SharedFrameInfo) -> Self {
        Self {
            qp: QpStats {
                min: info.qp_min,
                max: info.qp_max,
                init: info.qp_init,
                avg: info.qp_avg,
                stdev: info.qp_stdev,
                bb_avg: info.qp_bb_avg,
                bb_stdev: info.qp_bb_stdev,
            },
            motion: MotionStats {
                avg: info.motion_avg,
                stdev: info.motion_stdev,
                x_avg: info.motion_x_avg,
                x_stdev: info.motion_x_stdev,
                y_avg: info.motion_y_avg,
                y_stdev: info.motion_y_stdev,
                diff_avg: info.motion_diff_avg,
                diff_stdev: info.motion_diff_stdev,
            },
            current_poc: info.current_poc,
            poc_diff: info.poc_diff,
            mb_mv_count: info.mb_mv_count,
            mv_coded_count: info.mv_coded_count,
            motion_bit_count: info.motion_bit_count,
            coefs_bit_count: info.coefs_bit_count,
        }
    }
}

/// Reads the statistics block attached to a decoded frame, if any.
pub fn read_aux(decoded: &frame::Video) -> Option<AuxMetrics> {
    // SAFETY: `decoded` is a live frame, and a non-null `opaque_ref` points
    // to a valid buffer reference owned by it.
    unsafe {
        let buf = (*decoded.as_ptr()).opaque_ref;
        if buf.is_null() {
            return None;
        }
        let data = (*buf).data;
        let size = usize::try_from((*buf).size).ok()?;
        if data.is_null() || size < size_of::<SharedFrameInfo>() {
            return None;
        }
        let info = ptr::read_unaligned(data.cast::<SharedFrameInfo>());
        Some(info.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_c_definition() {
        // 7 ints (+4 padding), 9 doubles, 3 ints (+4 padding), 12 doubles,
        // 6 ints.
        assert_eq!(size_of::<SharedFrameInfo>(), 7 * 4 + 4 + 9 * 8 + 3 * 4 + 4 + 12 * 8 + 6 * 4);
        assert_eq!(std::mem::align_of::<SharedFrameInfo>(), 8);
    }

    #[test]
    fn converts_exported_fields() {
        let info = SharedFrameInfo {
            qp_min: 22,
            qp_max: 41,
            qp_init: 30,
            qp_avg: 31.5,
            motion_x_stdev: 1.25,
            current_poc: 8,
            poc_diff: 2,
            mb_mv_count: 120,
            coefs_bit_count: 9000,
            qp_sum: 77,
            ..SharedFrameInfo::default()
        };
        let aux = AuxMetrics::from(info);
        assert_eq!(aux.qp.min, 22);
        assert_eq!(aux.qp.max, 41);
        assert_eq!(aux.qp.init, 30);
        assert!((aux.qp.avg - 31.5).abs() < f64::EPSILON);
        assert!((aux.motion.x_stdev - 1.25).abs() < f64::EPSILON);
        assert_eq!(aux.current_poc, 8);
        assert_eq!(aux.poc_diff, 2);
        assert_eq!(aux.mb_mv_count, 120);
        assert_eq!(aux.coefs_bit_count, 9000);
    }
}
