//! Gemini API連携
//!
//! 画像 + 作業区分別プロンプト + 固定システム指示 + レスポンススキーマを送り、
//! 構造化JSONとして SafetyAnalysis を受け取る。

use crate::config::Config;
use crate::error::{Result, SafeScanError};
use async_trait::async_trait;
use safescan_common::{
    build_analysis_prompt, parse_analysis_response, response_schema, split_data_url,
    AnalysisError, AnalysisGateway, JobCategory, SafetyAnalysis, ANALYSIS_SYSTEM_INSTRUCTION,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Gemini APIリクエスト
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: String,
    response_schema: serde_json::Value,
}

/// Gemini APIレスポンス
#[derive(Debug, Deserialize)]
pub(crate) struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiResponse {
    /// 最初の候補のテキストを連結して返す。空ならNone
    pub(crate) fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// リクエスト本文の組み立て（Data URLのプレフィックスはここで除去）
pub(crate) fn build_request(
    image: &str,
    job: JobCategory,
    temperature: f32,
) -> std::result::Result<GeminiRequest, AnalysisError> {
    let (mime_type, data) = split_data_url(image)
        .ok_or_else(|| AnalysisError::new("画像がData URL形式ではありません"))?;

    Ok(GeminiRequest {
        contents: vec![Content {
            parts: vec![
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.to_string(),
                        data: data.to_string(),
                    },
                },
                Part::Text {
                    text: build_analysis_prompt(job),
                },
            ],
        }],
        system_instruction: Content {
            parts: vec![Part::Text {
                text: ANALYSIS_SYSTEM_INSTRUCTION.to_string(),
            }],
        },
        generation_config: GenerationConfig {
            temperature,
            response_mime_type: "application/json".to_string(),
            response_schema: response_schema(),
        },
    })
}

/// Gemini を使う解析ゲートウェイ
pub struct GeminiGateway {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl GeminiGateway {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.get_api_key()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SafeScanError::ApiCall(format!("HTTPクライアント初期化エラー: {}", e)))?;

        let endpoint = format!(
            "{}/models/{}:generateContent",
            config.api_base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            client,
            api_key,
            endpoint,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn call(&self, request: &GeminiRequest) -> std::result::Result<String, AnalysisError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AnalysisError::new(format!("通信エラー: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::new(format!("API error {}: {}", status, body)));
        }

        let payload: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::new(format!("レスポンス形式エラー: {}", e)))?;

        payload
            .text()
            .ok_or_else(|| AnalysisError::new("Resposta vazia da IA."))
    }
}

#[async_trait(?Send)]
impl AnalysisGateway for GeminiGateway {
    async fn analyze(
        &self,
        image: &str,
        job: JobCategory,
    ) -> std::result::Result<SafetyAnalysis, AnalysisError> {
        let request = build_request(image, job, self.temperature)?;
        debug!("Gemini呼び出し: model={} job={}", self.model, job.key());

        let text = self.call(&request).await?;
        debug!("Gemini応答: {} chars", text.len());

        Ok(parse_analysis_response(&text)?)
    }
}
