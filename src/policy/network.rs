use crate::error::DbaError;
use serde::{Deserialize, Serialize};

/// Activation applied element-wise after a layer's affine transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Tanh,
    Sigmoid,
    Linear,
}

impl Activation {
    fn apply(&self, x: f64) -> f64 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Linear => x,
        }
    }
}

/// One dense layer: `weights` is row-major, one row per output unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
    pub activation: Activation,
}

impl Layer {
    fn forward(&self, input: &[f64]) -> Result<Vec<f64>, DbaError> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(row, &bias)| {
                if row.len() != input.len() {
                    return Err(DbaError::InferenceFailure(format!(
                        "layer expects {} inputs, got {}",
                        row.len(),
                        input.len()
                    )));
                }
                let sum: f64 = row.iter().zip(input).map(|(w, x)| w * x).sum();
                Ok(self.activation.apply(sum + bias))
            })
            .collect()
    }
}

/// A feed-forward policy: the inference backend behind the learned
/// strategy. Weights come from a policy package; this crate only runs
/// them, it never trains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyNetwork {
    pub layers: Vec<Layer>,
}

impl PolicyNetwork {
    /// Input width of the first layer, if any.
    pub fn input_size(&self) -> Option<usize> {
        self.layers.first().and_then(|l| l.weights.first()).map(Vec::len)
    }

    /// Output width of the last layer, if any.
    pub fn output_size(&self) -> Option<usize> {
        self.layers.last().map(|l| l.biases.len())
    }

    pub fn infer(&self, observation: &[f64]) -> Result<Vec<f64>, DbaError> {
        if self.layers.is_empty() {
            return Err(DbaError::InferenceFailure("policy has no layers".to_string()));
        }
        let mut activations = observation.to_vec();
        for layer in &self.layers {
            activations = layer.forward(&activations)?;
        }
        if activations.iter().any(|x| !x.is_finite()) {
            return Err(DbaError::InferenceFailure(
                "policy produced a non-finite output".to_string(),
            ));
        }
        Ok(activations)
    }
}

#[cfg(test)]
impl PolicyNetwork {
    /// Single linear layer that averages its inputs into each output.
    pub(crate) fn averaging(inputs: usize, outputs: usize) -> Self {
        Self {
            layers: vec![Layer {
                weights: vec![vec![1.0 / inputs as f64; inputs]; outputs],
                biases: vec![0.0; outputs],
                activation: Activation::Linear,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn averaging_network(inputs: usize, outputs: usize) -> PolicyNetwork {
        PolicyNetwork::averaging(inputs, outputs)
    }

    #[test]
    fn test_forward_pass() {
        let net = averaging_network(4, 2);
        let out = net.infer(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(out, vec![2.5, 2.5]);
        assert_eq!(net.input_size(), Some(4));
        assert_eq!(net.output_size(), Some(2));
    }

    #[test]
    fn test_relu_clamps_negatives() {
        let net = PolicyNetwork {
            layers: vec![Layer {
                weights: vec![vec![1.0], vec![-1.0]],
                biases: vec![0.0, 0.0],
                activation: Activation::Relu,
            }],
        };
        assert_eq!(net.infer(&[2.0]).unwrap(), vec![2.0, 0.0]);
    }

    #[test]
    fn test_input_size_mismatch_is_an_error() {
        let net = averaging_network(4, 2);
        assert!(matches!(
            net.infer(&[1.0, 2.0]),
            Err(DbaError::InferenceFailure(_))
        ));
    }

    #[test]
    fn test_empty_network_is_an_error() {
        let net = PolicyNetwork { layers: vec![] };
        assert!(net.infer(&[1.0]).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let net = averaging_network(3, 3);
        let json = serde_json::to_string(&net).unwrap();
        let back: PolicyNetwork = serde_json::from_str(&json).unwrap();
        assert_eq!(back.infer(&[3.0, 3.0, 3.0]).unwrap(), vec![3.0, 3.0, 3.0]);
    }
}
