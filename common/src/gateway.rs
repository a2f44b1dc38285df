//! 解析ゲートウェイの境界定義
//!
//! 外部の画像解析AIを「画像 + 作業区分 → SafetyAnalysis」の関数として抽象化する。
//! 本番実装（HTTP）とテスト実装を差し替えられる。

use crate::job::JobCategory;
use crate::types::SafetyAnalysis;
use async_trait::async_trait;
use thiserror::Error;

/// 利用者に表示する唯一の失敗メッセージ
pub const ANALYSIS_FAILED_MESSAGE: &str =
    "Falha na análise técnica. Verifique se a imagem está clara e focada no trabalhador.";

/// 解析失敗
///
/// 表示は常に [`ANALYSIS_FAILED_MESSAGE`]。詳細はログ用に `cause` に保持する。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", ANALYSIS_FAILED_MESSAGE)]
pub struct AnalysisError {
    cause: String,
}

impl AnalysisError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self { cause: cause.into() }
    }

    /// 内部の失敗理由（ログ専用）
    pub fn cause(&self) -> &str {
        &self.cause
    }

    /// 利用者向けメッセージ
    pub fn user_message(&self) -> &'static str {
        ANALYSIS_FAILED_MESSAGE
    }
}

impl From<crate::error::Error> for AnalysisError {
    fn from(err: crate::error::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// 画像解析AIの呼び出し口
///
/// `image` はData URL。実装側でプレフィックスを除去して送信する。
#[async_trait(?Send)]
pub trait AnalysisGateway {
    async fn analyze(&self, image: &str, job: JobCategory) -> Result<SafetyAnalysis, AnalysisError>;
}

#[async_trait(?Send)]
impl<G: AnalysisGateway + ?Sized> AnalysisGateway for &G {
    async fn analyze(&self, image: &str, job: JobCategory) -> Result<SafetyAnalysis, AnalysisError> {
        (**self).analyze(image, job).await
    }
}
