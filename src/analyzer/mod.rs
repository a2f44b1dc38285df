//! 解析ゲートウェイの実装

mod gemini;

pub use gemini::GeminiGateway;
