use thiserror::Error;

#[derive(Error, Debug)]
pub enum SafeScanError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`safescan config --set-api-key YOUR_KEY` で設定するか GEMINI_API_KEY を指定してください")]
    MissingApiKey,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("対応していない画像形式です: {0}")]
    UnsupportedImage(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("履歴に記録がありません: {0}")]
    RecordNotFound(String),

    #[error("PDF生成エラー: {0}")]
    PdfGeneration(String),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] safescan_common::Error),
}

pub type Result<T> = std::result::Result<T, SafeScanError>;

impl From<dialoguer::Error> for SafeScanError {
    fn from(err: dialoguer::Error) -> Self {
        SafeScanError::Prompt(err.to_string())
    }
}
