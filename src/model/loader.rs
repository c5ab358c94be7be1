use std::path::Path;

use parking_lot::Mutex;
use tch::{Device, Kind, Tensor, no_grad};
use tokenizers::Tokenizer;

use crate::{
    error::ServiceError,
    model::{adapter::TextBackend, types::SamplingParams},
};

const MODULE_FILE: &str = "model.ts";
const TOKENIZER_FILE: &str = "tokenizer.json";
const EOS_TOKEN: &str = "<|endoftext|>";

/// TorchScript causal language model plus its tokenizer.
pub struct TorchBackend {
    tokenizer: Tokenizer,
    eos_token_id: Option<i64>,
    device: Device,
    module: Mutex<tch::CModule>,
}

impl TorchBackend {
    pub fn load(dir: &Path, device: &str) -> Result<Self, ServiceError> {
        let module_path = dir.join(MODULE_FILE);
        let tokenizer_path = dir.join(TOKENIZER_FILE);
        for path in [&module_path, &tokenizer_path] {
            if !path.exists() {
                return Err(ServiceError::BackendUnavailable(format!(
                    "model artifact missing: {}",
                    path.display()
                )));
            }
        }

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ServiceError::BackendUnavailable(format!("tokenizer: {e}")))?;
        let eos_token_id = tokenizer.token_to_id(EOS_TOKEN).map(i64::from);

        let device = parse_device(device);
        let mut module = tch::CModule::load_on_device(&module_path, device)
            .map_err(|e| ServiceError::BackendUnavailable(e.to_string()))?;
        module.set_eval();

        Ok(Self {
            tokenizer,
            eos_token_id,
            device,
            module: Mutex::new(module),
        })
    }

    fn next_token(&self, logits: &Tensor, params: &SamplingParams) -> i64 {
        if params.temperature <= 0.0 {
            return logits.argmax(0, false).int64_value(&[]);
        }

        let probs = (logits / params.temperature).softmax(-1, Kind::Float);
        let (sorted, indices) = probs.sort(-1, true);
        let cumulative = sorted.cumsum(-1, Kind::Float);
        // Keep the smallest prefix whose mass reaches top_p; the top token always survives.
        let outside_nucleus = (&cumulative - &sorted).gt(params.top_p);
        let nucleus = sorted.masked_fill(&outside_nucleus, 0.0);
        let pick = nucleus.multinomial(1, false).int64_value(&[0]);
        indices.int64_value(&[pick])
    }
}

impl TextBackend for TorchBackend {
    fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<String, ServiceError> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| ServiceError::BackendGeneration(format!("tokenizer: {e}")))?;
        let mut input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        if input_ids.is_empty() {
            input_ids.push(0);
        }
        let prompt_token_len = input_ids.len();

        no_grad(|| {
            let module = self.module.lock();

            for _ in 0..params.max_new_tokens {
                let input_tensor = Tensor::from_slice(&input_ids)
                    .reshape([1, input_ids.len() as i64])
                    .to(self.device);

                // Traced models return either the logits or a (logits, past) tuple.
                let output = module
                    .forward_is(&[tch::IValue::Tensor(input_tensor)])
                    .map_err(|e| ServiceError::BackendGeneration(e.to_string()))?;
                let logits = match output {
                    tch::IValue::Tensor(t) => t,
                    tch::IValue::Tuple(ref tuple) if !tuple.is_empty() => match &tuple[0] {
                        tch::IValue::Tensor(t) => t.shallow_clone(),
                        _ => {
                            return Err(ServiceError::BackendGeneration(
                                "expected tensor as first tuple element".into(),
                            ));
                        }
                    },
                    _ => {
                        return Err(ServiceError::BackendGeneration(
                            "unexpected model output format".into(),
                        ));
                    }
                };

                // [1, seq_len, vocab] -> [vocab]
                let last_logits = logits.select(1, -1).squeeze().to_kind(Kind::Float);
                let next_token_id = self.next_token(&last_logits, params);
                if Some(next_token_id) == self.eos_token_id {
                    break;
                }
                input_ids.push(next_token_id);
            }

            Ok::<(), ServiceError>(())
        })?;

        let generated_ids: Vec<u32> = input_ids[prompt_token_len..]
            .iter()
            .map(|&id| id as u32)
            .collect();

        self.tokenizer
            .decode(&generated_ids, true)
            .map_err(|e| ServiceError::BackendGeneration(format!("tokenizer: {e}")))
    }

    fn method(&self) -> &'static str {
        "torchscript"
    }

    fn device(&self) -> String {
        match self.device {
            Device::Cpu => "cpu".to_string(),
            Device::Cuda(idx) => format!("cuda:{idx}"),
            other => format!("{other:?}").to_lowercase(),
        }
    }
}

fn parse_device(raw: &str) -> Device {
    let lower = raw.to_lowercase();
    if lower.starts_with("cuda") {
        let idx = lower
            .split(':')
            .nth(1)
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(0);
        if tch::Cuda::is_available() {
            return Device::Cuda(idx);
        }
    }
    Device::Cpu
}
