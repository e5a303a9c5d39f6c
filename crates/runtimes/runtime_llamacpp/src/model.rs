//! GGUF model loading and the token generation loop

use anyhow::Result;
use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::{AddBos, LlamaModel};
use llama_cpp_2::sampling::LlamaSampler;
use llamashim_runtime_api::{
    truncate_at_stop, CompletionRequest, CompletionResponse, FinishReason, RuntimeConfig,
};
use std::num::NonZeroU32;
use std::sync::OnceLock;

/// llama.cpp's LLAMA_DEFAULT_SEED: the sampler picks a random seed.
const RANDOM_SEED: u32 = u32::MAX;

const TOP_K: i32 = 40;
const TOP_P: f32 = 0.95;

/// llama_backend_init() is process-global; it must run once and never be freed
/// while models are live.
static LLAMA_BACKEND: OnceLock<std::result::Result<LlamaBackend, String>> = OnceLock::new();

fn backend() -> Result<&'static LlamaBackend> {
    LLAMA_BACKEND
        .get_or_init(|| LlamaBackend::init().map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to init llama backend: {}", e))
}

pub struct LoadedModel {
    model: LlamaModel,
    context_size: NonZeroU32,
    threads: Option<i32>,
}

impl LoadedModel {
    pub fn load(config: &RuntimeConfig) -> Result<Self> {
        let (context_size, threads) = context_settings(config)?;

        if !config.model_path.is_file() {
            anyhow::bail!("Model path does not exist: {}", config.model_path.display());
        }

        let backend = backend()?;
        let params = LlamaModelParams::default().with_n_gpu_layers(config.gpu_layers);

        let model = LlamaModel::load_from_file(backend, &config.model_path, &params)
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;

        tracing::info!("GGUF loaded, trained context {}", model.n_ctx_train());

        Ok(Self {
            model,
            context_size,
            threads,
        })
    }

    /// Run the prompt through a fresh context and sample until EOG, a stop
    /// sequence, or the token budget. Blocking; call from a worker thread.
    pub fn generate(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let backend = backend()?;

        let mut ctx_params = LlamaContextParams::default()
            .with_n_ctx(Some(self.context_size))
            .with_n_batch(self.context_size.get());
        if let Some(threads) = self.threads {
            ctx_params = ctx_params
                .with_n_threads(threads)
                .with_n_threads_batch(threads);
        }

        let mut ctx = self
            .model
            .new_context(backend, ctx_params)
            .map_err(|e| anyhow::anyhow!("Failed to create context: {:?}", e))?;

        let tokens = self
            .model
            .str_to_token(&request.prompt, AddBos::Always)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {:?}", e))?;

        let prompt_tokens = tokens.len() as u32;
        let budget = token_budget(prompt_tokens, self.context_size.get(), request.max_tokens)?;

        let mut batch = LlamaBatch::new(self.context_size.get() as usize, 1);
        let last_index = tokens.len() as i32 - 1;
        for (i, token) in (0_i32..).zip(tokens.into_iter()) {
            batch
                .add(token, i, &[0], i == last_index)
                .map_err(|e| anyhow::anyhow!("Batch add failed: {:?}", e))?;
        }

        ctx.decode(&mut batch)
            .map_err(|e| anyhow::anyhow!("Prompt decode failed: {:?}", e))?;

        let mut sampler = if request.temperature <= 0.0 {
            LlamaSampler::greedy()
        } else {
            LlamaSampler::chain_simple([
                LlamaSampler::top_k(TOP_K),
                LlamaSampler::top_p(TOP_P, 1),
                LlamaSampler::temp(request.temperature),
                LlamaSampler::dist(RANDOM_SEED),
            ])
        };

        let mut decoder = encoding_rs::UTF_8.new_decoder();
        let mut text = String::new();
        let mut completion_tokens = 0u32;
        let mut finish_reason = FinishReason::Length;
        let mut n_cur = batch.n_tokens();

        while completion_tokens < budget {
            let token = sampler.sample(&ctx, batch.n_tokens() - 1);
            sampler.accept(token);

            if self.model.is_eog_token(token) {
                finish_reason = FinishReason::Stop;
                break;
            }
            completion_tokens += 1;

            match self.model.token_to_piece(token, &mut decoder, true, None) {
                Ok(piece) => text.push_str(&piece),
                Err(e) => tracing::debug!("Skipping undecodable token {}: {:?}", token.0, e),
            }

            if truncate_at_stop(&mut text, &request.stop) {
                finish_reason = FinishReason::Stop;
                break;
            }

            batch.clear();
            batch
                .add(token, n_cur, &[0], true)
                .map_err(|e| anyhow::anyhow!("Batch add failed: {:?}", e))?;
            n_cur += 1;

            ctx.decode(&mut batch)
                .map_err(|e| anyhow::anyhow!("Decode failed: {:?}", e))?;
        }

        Ok(CompletionResponse {
            text,
            prompt_tokens,
            completion_tokens,
            finish_reason,
        })
    }
}

/// Tokens left for generation once the prompt occupies the context window.
fn token_budget(prompt_tokens: u32, context_size: u32, max_tokens: Option<u32>) -> Result<u32> {
    if prompt_tokens >= context_size {
        anyhow::bail!(
            "Requested tokens ({}) exceed context window of {}",
            prompt_tokens,
            context_size
        );
    }

    let room = context_size - prompt_tokens;
    Ok(max_tokens.map_or(room, |max| max.min(room)))
}

/// Checked context window and thread count in the types llama.cpp takes.
fn context_settings(config: &RuntimeConfig) -> Result<(NonZeroU32, Option<i32>)> {
    let context_size = NonZeroU32::new(config.context_size)
        .ok_or_else(|| anyhow::anyhow!("Context size must be greater than zero"))?;
    let threads = config
        .cpu_threads
        .map(|threads| {
            i32::try_from(threads)
                .map_err(|_| anyhow::anyhow!("Thread count {} is out of range", threads))
        })
        .transpose()?;
    Ok((context_size, threads))
}
