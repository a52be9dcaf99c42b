//! Adam with global gradient-norm clipping and step-wise learning-rate decay.

use nalgebra::DVector;

use crate::config::SolverConfig;

#[derive(Debug, Clone)]
pub struct Adam {
    lr: f64,
    beta1: f64,
    beta2: f64,
    eps: f64,
    m: DVector<f64>,
    v: DVector<f64>,
    t: i32,
}

impl Adam {
    pub fn new(len: usize, config: &SolverConfig) -> Self {
        Self {
            lr: config.learning_rate,
            beta1: config.adam_beta1,
            beta2: config.adam_beta2,
            eps: config.adam_eps,
            m: DVector::zeros(len),
            v: DVector::zeros(len),
            t: 0,
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.lr
    }

    /// Multiply the learning rate by `gamma`.
    pub fn decay(&mut self, gamma: f64) {
        self.lr *= gamma;
    }

    /// One bias-corrected update of `params` against `grad`.
    pub fn step(&mut self, params: &mut DVector<f64>, grad: &DVector<f64>) {
        self.t += 1;
        self.m = &self.m * self.beta1 + grad * (1.0 - self.beta1);
        self.v = &self.v * self.beta2 + grad.component_mul(grad) * (1.0 - self.beta2);

        let bc1 = 1.0 - self.beta1.powi(self.t);
        let bc2 = 1.0 - self.beta2.powi(self.t);
        for i in 0..params.len() {
            let m_hat = self.m[i] / bc1;
            let v_hat = self.v[i] / bc2;
            params[i] -= self.lr * m_hat / (v_hat.sqrt() + self.eps);
        }
    }
}

/// Rescale `grad` in place so its L2 norm is at most `max_norm`. Returns the norm before clipping.
pub fn clip_grad_norm(grad: &mut DVector<f64>, max_norm: f64) -> f64 {
    let norm = grad.norm();
    if max_norm > 0.0 && norm > max_norm {
        *grad *= max_norm / norm;
    }
    norm
}
