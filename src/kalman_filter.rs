use crate::error::TrackError;
use nalgebra::{SMatrix, SVector};

/* -----------------------------------------------------------------------------
 * Type aliases
 * ----------------------------------------------------------------------------- */
// 6x1, [cx, cy, vx, vy, w, h]
pub type StateMean = SVector<f32, 6>;
// 6x6
pub type StateCov = SMatrix<f32, 6, 6>;
// 4x1, [cx, cy, w, h]
pub type Measurement = SVector<f32, 4>;
// 4x6
pub type MeasurementMat = SMatrix<f32, 4, 6>;
// 4x4
pub type InnovationCov = SMatrix<f32, 4, 4>;

/* -----------------------------------------------------------------------------
 * Kalman Filter
 * ----------------------------------------------------------------------------- */

/// Constant-velocity filter over box center, with width and height held
/// constant between frames.
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    transition_mat: StateCov,          // 6x6
    measurement_mat: MeasurementMat,   // 4x6
    process_noise: StateCov,           // 6x6
    measurement_noise: InnovationCov,  // 4x4
    mean: StateMean,
    covariance: StateCov,
}

impl KalmanFilter {
    /// Filter seeded with `mean` and an isotropic covariance.
    pub fn new(
        mean: StateMean,
        process_noise: &[f32; 6],
        measurement_noise: f32,
        initial_covariance: f32,
    ) -> Self {
        // 1.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        // 0.0, 1.0, 0.0, 0.0, 0.0, 0.0,
        // 0.0, 0.0, 0.0, 0.0, 1.0, 0.0,
        // 0.0, 0.0, 0.0, 0.0, 0.0, 1.0,
        let mut measurement_mat = MeasurementMat::zeros();
        measurement_mat[(0, 0)] = 1.0;
        measurement_mat[(1, 1)] = 1.0;
        measurement_mat[(2, 4)] = 1.0;
        measurement_mat[(3, 5)] = 1.0;

        Self {
            transition_mat: StateCov::identity(),
            measurement_mat,
            process_noise: StateCov::from_diagonal(
                &StateMean::from_column_slice(process_noise),
            ),
            measurement_noise: InnovationCov::identity() * measurement_noise,
            mean,
            covariance: StateCov::identity() * initial_covariance,
        }
    }

    /// Set the elapsed time used by the next `predict`.
    pub fn set_dt(&mut self, dt: f32) {
        self.transition_mat[(0, 2)] = dt;
        self.transition_mat[(1, 3)] = dt;
    }

    pub fn state(&self) -> &StateMean {
        &self.mean
    }

    pub fn covariance(&self) -> &StateCov {
        &self.covariance
    }

    pub fn predict(&mut self) -> StateMean {
        self.mean = self.transition_mat * self.mean;
        self.covariance = self.transition_mat
            * self.covariance
            * self.transition_mat.transpose()
            + self.process_noise;
        self.mean
    }

    pub fn correct(
        &mut self,
        measurement: &Measurement,
    ) -> Result<StateMean, TrackError> {
        let (projected_mean, projected_cov) = self.project();

        let cholesky_factor = projected_cov.cholesky().ok_or_else(|| {
            TrackError::FilterError(
                "innovation covariance is not positive definite".into(),
            )
        })?;
        // kalman_gain: 6x4, solved as S^-1 (H P) and transposed
        let kalman_gain = cholesky_factor
            .solve(&(self.measurement_mat * self.covariance))
            .transpose();

        let innovation = measurement - projected_mean;
        let mean = self.mean + kalman_gain * innovation;
        let covariance = (StateCov::identity()
            - kalman_gain * self.measurement_mat)
            * self.covariance;

        if !mean.iter().chain(covariance.iter()).all(|v| v.is_finite()) {
            return Err(TrackError::FilterError(
                "correction produced a non-finite state".into(),
            ));
        }
        self.mean = mean;
        self.covariance = covariance;
        Ok(self.mean)
    }

    /// Project the state into measurement space: `(H x, H P H^T + R)`.
    pub fn project(&self) -> (Measurement, InnovationCov) {
        let projected_mean = self.measurement_mat * self.mean;
        let projected_cov = self.measurement_mat
            * self.covariance
            * self.measurement_mat.transpose()
            + self.measurement_noise;
        (projected_mean, projected_cov)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nearly_eq::assert_nearly_eq;

    const Q: [f32; 6] = [1e-2, 1e-2, 2.0, 1.0, 1e-2, 1e-2];

    fn filter_at(cx: f32, cy: f32, w: f32, h: f32) -> KalmanFilter {
        let mean = StateMean::from([cx, cy, 0.0, 0.0, w, h]);
        KalmanFilter::new(mean, &Q, 1e-1, 1.0)
    }

    #[test]
    fn test_new() {
        let kf = filter_at(5.0, 5.0, 10.0, 10.0);
        let expected = StateMean::from([5.0, 5.0, 0.0, 0.0, 10.0, 10.0]);
        assert_eq!(*kf.state(), expected);
        assert_eq!(*kf.covariance(), StateCov::identity());
    }

    #[test]
    fn test_predict() {
        let mut kf = KalmanFilter::new(
            StateMean::from([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            &Q,
            1e-1,
            1.0,
        );
        kf.set_dt(0.5);
        let mean = kf.predict();

        assert_eq!(mean, StateMean::from([2.5, 4.0, 3.0, 4.0, 5.0, 6.0]));
        #[rustfmt::skip]
        let expected = StateCov::from_row_slice(&[
            1.26, 0.0,  0.5, 0.0, 0.0,  0.0,
            0.0,  1.26, 0.0, 0.5, 0.0,  0.0,
            0.5,  0.0,  3.0, 0.0, 0.0,  0.0,
            0.0,  0.5,  0.0, 2.0, 0.0,  0.0,
            0.0,  0.0,  0.0, 0.0, 1.01, 0.0,
            0.0,  0.0,  0.0, 0.0, 0.0,  1.01,
        ]);
        for (v, e) in kf.covariance().iter().zip(expected.iter()) {
            assert_nearly_eq!(*v, *e, 1e-5);
        }
    }

    #[test]
    fn test_project() {
        let kf = filter_at(1.0, 2.0, 3.0, 4.0);
        let (mean, cov) = kf.project();
        assert_eq!(mean, Measurement::from([1.0, 2.0, 3.0, 4.0]));
        for (v, e) in cov.iter().zip((InnovationCov::identity() * 1.1).iter()) {
            assert_nearly_eq!(*v, *e, 1e-6);
        }
    }

    #[test]
    fn test_correct_pulls_toward_measurement() {
        let mut kf = filter_at(5.0, 5.0, 10.0, 10.0);
        let mean = kf
            .correct(&Measurement::from([7.0, 5.0, 10.0, 10.0]))
            .unwrap();

        // P = I, R = 0.1 I  =>  gain 1 / 1.1 on measured components
        assert_nearly_eq!(mean[0], 5.0 + 2.0 / 1.1, 1e-4);
        assert_nearly_eq!(mean[1], 5.0, 1e-5);
        // velocity is uncorrelated with position before any predict
        assert_nearly_eq!(mean[2], 0.0, 1e-6);
        assert_nearly_eq!(kf.covariance()[(0, 0)], 0.1 / 1.1, 1e-5);
        assert_nearly_eq!(kf.covariance()[(2, 2)], 1.0, 1e-5);
    }

    #[test]
    fn test_correct_infers_velocity_after_predict() {
        let mut kf = filter_at(5.0, 5.0, 10.0, 10.0);
        kf.set_dt(1.0);
        kf.predict();
        let mean = kf
            .correct(&Measurement::from([7.0, 5.0, 10.0, 10.0]))
            .unwrap();

        // P_pred[0,0] = 2.01, P_pred[0,2] = 1  =>  gains 2.01/2.11 and 1/2.11
        assert_nearly_eq!(mean[0], 5.0 + 2.0 * 2.01 / 2.11, 1e-4);
        assert_nearly_eq!(mean[2], 2.0 / 2.11, 1e-4);
        assert_nearly_eq!(mean[3], 0.0, 1e-6);
    }

    #[test]
    fn test_repeated_measurement_converges() {
        let mut kf = filter_at(50.0, 40.0, 20.0, 30.0);
        kf.set_dt(1.0 / 30.0);
        let z = Measurement::from([50.0, 40.0, 20.0, 30.0]);
        for _ in 0..50 {
            kf.correct(&z).unwrap();
            kf.predict();
        }
        let mean = kf.state();
        assert_nearly_eq!(mean[0], 50.0, 1e-3);
        assert_nearly_eq!(mean[1], 40.0, 1e-3);
        assert_nearly_eq!(mean[2], 0.0, 1e-3);
        assert_nearly_eq!(mean[4], 20.0, 1e-3);
        assert_nearly_eq!(mean[5], 30.0, 1e-3);
    }

    #[test]
    fn test_correct_rejects_non_finite() {
        let mut kf = filter_at(5.0, 5.0, 10.0, 10.0);
        let before = *kf.state();
        let err = kf.correct(&Measurement::from([f32::NAN, 5.0, 10.0, 10.0]));
        assert!(matches!(err, Err(TrackError::FilterError(_))));
        assert_eq!(*kf.state(), before);
    }
}
