use gazecal_core::{from_homogeneous, to_homogeneous, Mat3, Pt2};
use nalgebra::DMatrix;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HomographyError {
    #[error("need at least 4 point correspondences, got {0}")]
    NotEnoughPoints(usize),
    #[error("source and target counts differ: {src} vs {dst}")]
    MismatchedPoints { src: usize, dst: usize },
    #[error("point configuration is degenerate")]
    Degenerate,
    #[error("svd failed")]
    SvdFailed,
}

/// Similarity transform moving a point set to centroid zero and mean
/// distance sqrt(2). Conditions the DLT system for least-squares solves.
fn normalizing_transform(points: &[Pt2]) -> Result<Mat3, HomographyError> {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;

    let mean_dist = points
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    if mean_dist < f64::EPSILON {
        return Err(HomographyError::Degenerate);
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    Ok(Mat3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0))
}

fn transform_point(t: &Mat3, p: &Pt2) -> Pt2 {
    from_homogeneous(&(t * to_homogeneous(p)))
}

/// Estimate H such that `dst ~ H src` with a normalized DLT.
///
/// With exactly four correspondences this is the classic perspective
/// transform; with more, the overdetermined system is solved in a
/// least-squares sense via SVD.
pub fn fit_homography(src: &[Pt2], dst: &[Pt2]) -> Result<Mat3, HomographyError> {
    let n = src.len();
    if n != dst.len() {
        return Err(HomographyError::MismatchedPoints {
            src: n,
            dst: dst.len(),
        });
    }
    if n < 4 {
        return Err(HomographyError::NotEnoughPoints(n));
    }

    let t_src = normalizing_transform(src)?;
    let t_dst = normalizing_transform(dst)?;

    let mut a = DMatrix::<f64>::zeros(2 * n, 9);
    for (i, (ps, pd)) in src.iter().zip(dst.iter()).enumerate() {
        let s = transform_point(&t_src, ps);
        let d = transform_point(&t_dst, pd);
        let (x, y) = (s.x, s.y);
        let (u, v) = (d.x, d.y);

        let r0 = 2 * i;
        let r1 = 2 * i + 1;

        a[(r0, 0)] = -x;
        a[(r0, 1)] = -y;
        a[(r0, 2)] = -1.0;
        a[(r0, 6)] = u * x;
        a[(r0, 7)] = u * y;
        a[(r0, 8)] = u;

        a[(r1, 3)] = -x;
        a[(r1, 4)] = -y;
        a[(r1, 5)] = -1.0;
        a[(r1, 6)] = v * x;
        a[(r1, 7)] = v * y;
        a[(r1, 8)] = v;
    }

    // Solve A h = 0: right singular vector of the smallest singular value.
    let svd = a.svd(false, true);
    let v_t = svd.v_t.ok_or(HomographyError::SvdFailed)?;
    let h = v_t.row(v_t.nrows() - 1);

    let mut h_norm = Mat3::zeros();
    for r in 0..3 {
        for c in 0..3 {
            h_norm[(r, c)] = h[3 * r + c];
        }
    }

    // Undo the conditioning transforms.
    let t_dst_inv = t_dst.try_inverse().ok_or(HomographyError::Degenerate)?;
    let mut h_mat = t_dst_inv * h_norm * t_src;

    let scale = h_mat[(2, 2)];
    if scale.abs() < f64::EPSILON {
        return Err(HomographyError::Degenerate);
    }
    h_mat /= scale;

    Ok(h_mat)
}

/// Apply a homography to a 2D point.
pub fn apply_homography(h: &Mat3, p: &Pt2) -> Pt2 {
    from_homogeneous(&(h * to_homogeneous(p)))
}
