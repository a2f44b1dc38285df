use clap::{Parser, Subcommand};
use safescan_common::JobCategory;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "safescan")]
#[command(about = "EPI点検AI解析・安全監査報告書（Laudo）生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像1枚を点検して結果を表示
    Inspect {
        /// 作業者の画像（jpg/png/webp）
        #[arg(required = true)]
        image: PathBuf,

        /// 作業区分 (construction/electrical/heights/chemical/welding/general)
        #[arg(short, long, default_value = "construction")]
        job: JobCategory,

        /// 報告書PDFも出力
        #[arg(long)]
        export: bool,

        /// PDFの出力先（ファイルまたはフォルダ、デフォルト: カレント）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// PDF画像品質 (high/medium/low)
        #[arg(long, default_value = "medium")]
        pdf_quality: PdfQuality,
    },

    /// 対話式の点検セッション
    Session {
        /// PDFの出力先
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// PDF画像品質 (high/medium/low)
        #[arg(long, default_value = "medium")]
        pdf_quality: PdfQuality,
    },

    /// 点検履歴の管理
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// 履歴の記録から報告書PDFを生成
    Export {
        /// 記録ID
        #[arg(required = true)]
        id: String,

        /// 出力ファイル/ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// PDF画像品質 (high/medium/low)
        #[arg(long, default_value = "medium")]
        pdf_quality: PdfQuality,
    },

    /// 作業区分と確認項目を表示
    Jobs,

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// モデルを設定
        #[arg(long)]
        set_model: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// 一覧表示（新しい順）
    List,
    /// 記録の詳細を表示
    Show {
        id: String,
    },
    /// 記録を削除
    Delete {
        id: String,
    },
    /// 全件削除
    Clear {
        /// 確認なしで削除
        #[arg(long)]
        yes: bool,
    },
}

/// PDF画像品質設定
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PdfQuality {
    /// 高品質: 1400px
    High,
    /// 中品質: 800px（デフォルト）
    #[default]
    Medium,
    /// 低品質: 500px
    Low,
}

impl PdfQuality {
    /// 埋め込み画像の最大ピクセル幅
    pub fn max_width(&self) -> u32 {
        match self {
            PdfQuality::High => 1400,
            PdfQuality::Medium => 800,
            PdfQuality::Low => 500,
        }
    }
}

impl std::str::FromStr for PdfQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" | "h" => Ok(PdfQuality::High),
            "medium" | "med" | "m" => Ok(PdfQuality::Medium),
            "low" | "l" => Ok(PdfQuality::Low),
            _ => Err(format!("Unknown quality: {}. Use high, medium, or low", s)),
        }
    }
}

impl std::fmt::Display for PdfQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PdfQuality::High => write!(f, "high"),
            PdfQuality::Medium => write!(f, "medium"),
            PdfQuality::Low => write!(f, "low"),
        }
    }
}
