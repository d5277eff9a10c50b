//! Stacked LSTM regressor over a window of scaled closing prices
//!
//! Tensor names: `lstm.{i}.{weight_ih_l0,weight_hh_l0,bias_ih_l0,bias_hh_l0}`,
//! `dense.{i}.{weight,bias}`, `output.{weight,bias}`.

use super::manifest::LstmManifest;
use candle_core::{Device, Module, Result, Tensor};
use candle_nn::{linear, lstm, LSTMConfig, Linear, VarBuilder, LSTM, RNN};

/// A loaded sequence model. Shared read-only across requests.
pub trait SequenceRegressor: Send + Sync {
    /// Time steps per input.
    fn window(&self) -> usize;

    fn device(&self) -> &Device;

    /// `(1, window, 1)` → `(1, 1)`, both in scaled units.
    fn predict(&self, input: &Tensor) -> Result<Tensor>;
}

pub struct PriceLstm {
    layers: Vec<LSTM>,
    dense: Vec<Linear>,
    output: Linear,
    window: usize,
    device: Device,
}

impl PriceLstm {
    pub fn new(manifest: &LstmManifest, vb: VarBuilder) -> Result<Self> {
        if manifest.lstm_units.is_empty() {
            candle_core::bail!("manifest declares no lstm layers");
        }
        if manifest.window == 0 {
            candle_core::bail!("manifest declares an empty window");
        }

        let mut layers = Vec::with_capacity(manifest.lstm_units.len());
        let mut in_dim = 1;
        for (i, &units) in manifest.lstm_units.iter().enumerate() {
            layers.push(lstm(in_dim, units, LSTMConfig::default(), vb.pp(format!("lstm.{i}")))?);
            in_dim = units;
        }

        let mut dense = Vec::with_capacity(manifest.dense_units.len());
        for (i, &units) in manifest.dense_units.iter().enumerate() {
            dense.push(linear(in_dim, units, vb.pp(format!("dense.{i}")))?);
            in_dim = units;
        }
        let output = linear(in_dim, 1, vb.pp("output"))?;

        tracing::info!(
            "📈 Built price LSTM: layers {:?}, dense {:?}, window {}",
            manifest.lstm_units,
            manifest.dense_units,
            manifest.window
        );

        Ok(Self {
            layers,
            dense,
            output,
            window: manifest.window,
            device: vb.device().clone(),
        })
    }
}

impl SequenceRegressor for PriceLstm {
    fn window(&self) -> usize {
        self.window
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn predict(&self, input: &Tensor) -> Result<Tensor> {
        let mut seq = input.clone();
        let last = self.layers.len() - 1;
        let mut hidden = None;

        for (i, layer) in self.layers.iter().enumerate() {
            let states = layer.seq(&seq)?;
            if i == last {
                match states.last() {
                    Some(state) => hidden = Some(state.h().clone()),
                    None => candle_core::bail!("empty input sequence"),
                }
            } else {
                seq = layer.states_to_tensor(&states)?;
            }
        }

        let mut x = match hidden {
            Some(h) => h,
            None => candle_core::bail!("no lstm output"),
        };
        for layer in &self.dense {
            x = layer.forward(&x)?;
        }
        self.output.forward(&x)
    }
}
