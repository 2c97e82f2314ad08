//! Whisper API client (OpenAI-compatible transcription endpoint).

use crate::config::TranscriptionConfig;
use crate::core::model::TranscriptChunk;
use crate::services::transcription::{SpeechEngine, TranscribeOptions, TranscriptOutput};
use crate::{Result, error::CutterError};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, multipart::Form};
use serde::Deserialize;
use std::io::Cursor;
use std::time::Duration;

/// Whisper HTTP client.
///
/// Works against the official endpoint as well as local
/// OpenAI-compatible Whisper servers (which accept the model size names
/// the configuration uses).
pub struct WhisperApiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    config: TranscriptionConfig,
}

impl WhisperApiClient {
    /// Create a Whisper API client.
    pub fn new(api_key: Option<String>, config: TranscriptionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds as u64))
            .build()
            .map_err(|e| {
                CutterError::TranscriptionFailed(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    /// Encode mono PCM samples as a 16-bit WAV upload body.
    fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(|e| {
                CutterError::TranscriptionFailed(format!("WAV encode failed: {}", e))
            })?;
            for &sample in samples {
                let value = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
                writer.write_sample(value).map_err(|e| {
                    CutterError::TranscriptionFailed(format!("WAV encode failed: {}", e))
                })?;
            }
            writer.finalize().map_err(|e| {
                CutterError::TranscriptionFailed(format!("WAV encode failed: {}", e))
            })?;
        }
        Ok(cursor.into_inner())
    }

    async fn try_transcribe(
        &self,
        wav_bytes: Vec<u8>,
        options: &TranscribeOptions,
    ) -> Result<TranscriptOutput> {
        let mut form = Form::new()
            .text("model", self.config.model.to_string())
            .text("chunk_length_s", options.chunk_length_s.to_string())
            .text("stride_length_s", options.stride_length_s.to_string())
            .part(
                "file",
                reqwest::multipart::Part::bytes(wav_bytes)
                    .file_name("segment.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| CutterError::TranscriptionFailed(e.to_string()))?,
            );
        if options.timestamps {
            form = form
                .text("response_format", "verbose_json")
                .text("timestamp_granularities[]", "segment");
        } else {
            form = form.text("response_format", "json");
        }

        let language = options
            .language
            .clone()
            .or_else(|| match self.config.language.as_str() {
                "auto" | "" => None,
                lang => Some(lang.to_string()),
            });
        if let Some(language) = language {
            form = form.text("language", language);
        }

        let mut request = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await.map_err(|e| {
            CutterError::TranscriptionFailed(format!("Whisper request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CutterError::TranscriptionFailed(format!(
                "Whisper API error {}: {}",
                status, text
            )));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            CutterError::TranscriptionFailed(format!("Failed to parse Whisper response: {}", e))
        })?;
        Ok(result.into_output())
    }
}

#[async_trait]
impl SpeechEngine for WhisperApiClient {
    async fn transcribe(
        &self,
        samples: &[f32],
        sample_rate: u32,
        options: &TranscribeOptions,
    ) -> Result<TranscriptOutput> {
        let wav_bytes = Self::encode_wav(samples, sample_rate)?;
        debug!(
            "whisper upload: {} samples ({} bytes)",
            samples.len(),
            wav_bytes.len()
        );

        let mut retries = 0;
        let mut last_error = None;
        while retries <= self.config.max_retries {
            match self.try_transcribe(wav_bytes.clone(), options).await {
                Ok(output) => return Ok(output),
                Err(e) => {
                    last_error = Some(e);
                    if retries < self.config.max_retries {
                        tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms))
                            .await;
                        retries += 1;
                        continue;
                    }
                    break;
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| CutterError::TranscriptionFailed("Unknown Whisper error".into())))
    }
}

/// Whisper API response structure.
#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

/// Whisper API timestamped segment.
#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

impl WhisperResponse {
    fn into_output(self) -> TranscriptOutput {
        TranscriptOutput {
            text: self.text.trim().to_string(),
            chunks: self
                .segments
                .into_iter()
                .map(|s| TranscriptChunk {
                    start: s.start,
                    end: s.end,
                    text: s.text.trim().to_string(),
                })
                .collect(),
        }
    }
}
