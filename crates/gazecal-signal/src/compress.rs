//! Per-frame compression of the filtered gaze stream.

use gazecal_core::{CompressedSample, DataShapeError, GazeRecord};
use tracing::debug;

/// Collapse consecutive records sharing a world frame into their mean.
///
/// The stream is frame-ordered, so grouping is a single pass. Fails on an
/// empty input; a stream that lost every record to blink removal has nothing
/// to compare against the calibration markers.
pub fn compress_frames(records: &[GazeRecord]) -> Result<Vec<CompressedSample>, DataShapeError> {
    let first = records.first().ok_or(DataShapeError::EmptyStream)?;

    let mut compressed = Vec::new();
    let mut frame = first.frame_index;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut count = 0usize;

    for record in records {
        if record.frame_index == frame {
            sum_x += record.x;
            sum_y += record.y;
            count += 1;
        } else {
            compressed.push(CompressedSample {
                frame_index: frame,
                x: sum_x / count as f64,
                y: sum_y / count as f64,
            });
            frame = record.frame_index;
            sum_x = record.x;
            sum_y = record.y;
            count = 1;
        }
    }
    compressed.push(CompressedSample {
        frame_index: frame,
        x: sum_x / count as f64,
        y: sum_y / count as f64,
    });

    debug!(
        input = records.len(),
        output = compressed.len(),
        "frame compression complete"
    );
    Ok(compressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(frame_index: u64, x: f64, y: f64) -> GazeRecord {
        GazeRecord {
            frame_index,
            timestamp: frame_index as f64 / 30.0,
            x,
            y,
        }
    }

    #[test]
    fn averages_samples_on_shared_frame() {
        let records = vec![record(5, 0.2, 0.1), record(5, 0.4, 0.3)];
        let compressed = compress_frames(&records).unwrap();
        assert_eq!(compressed.len(), 1);
        assert_eq!(compressed[0].frame_index, 5);
        assert!((compressed[0].x - 0.3).abs() < 1e-12);
        assert!((compressed[0].y - 0.2).abs() < 1e-12);
    }

    #[test]
    fn final_group_is_flushed() {
        let records = vec![
            record(1, 0.1, 0.1),
            record(2, 0.2, 0.2),
            record(2, 0.4, 0.4),
            record(3, 0.9, 0.9),
        ];
        let compressed = compress_frames(&records).unwrap();
        assert_eq!(compressed.len(), 3);
        assert_eq!(compressed[2].frame_index, 3);
        assert!((compressed[1].x - 0.3).abs() < 1e-12);
    }

    #[test]
    fn empty_stream_is_a_data_error() {
        assert!(matches!(
            compress_frames(&[]),
            Err(DataShapeError::EmptyStream)
        ));
    }
}
