//! 作業区分（JobCategory）の定義
//!
//! 区分ごとに必要なEPIチェックリストを持つ。
//! シリアライズ形式は表示ラベル（例: "Soldagem e Corte"）で、
//! 保存済み履歴との互換性を保つ。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 作業区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JobCategory {
    #[default]
    #[serde(rename = "Construção Civil")]
    Construction,
    #[serde(rename = "Serviços em Eletricidade (NR-10)")]
    Electrical,
    #[serde(rename = "Trabalho em Altura (NR-35)")]
    Heights,
    #[serde(rename = "Manipulação Química")]
    Chemical,
    #[serde(rename = "Soldagem e Corte")]
    Welding,
    #[serde(rename = "Manutenção Geral")]
    General,
}

impl JobCategory {
    /// 全区分（宣言順）
    pub const ALL: [JobCategory; 6] = [
        JobCategory::Construction,
        JobCategory::Electrical,
        JobCategory::Heights,
        JobCategory::Chemical,
        JobCategory::Welding,
        JobCategory::General,
    ];

    /// 表示ラベル（保存形式と同一）
    pub fn label(&self) -> &'static str {
        match self {
            JobCategory::Construction => "Construção Civil",
            JobCategory::Electrical => "Serviços em Eletricidade (NR-10)",
            JobCategory::Heights => "Trabalho em Altura (NR-35)",
            JobCategory::Chemical => "Manipulação Química",
            JobCategory::Welding => "Soldagem e Corte",
            JobCategory::General => "Manutenção Geral",
        }
    }

    /// CLI用の短縮キー
    pub fn key(&self) -> &'static str {
        match self {
            JobCategory::Construction => "construction",
            JobCategory::Electrical => "electrical",
            JobCategory::Heights => "heights",
            JobCategory::Chemical => "chemical",
            JobCategory::Welding => "welding",
            JobCategory::General => "general",
        }
    }

    /// 区分ごとの必須EPI（解析リクエストの補足にのみ使用）
    pub fn requirements(&self) -> &'static str {
        match self {
            JobCategory::Construction => {
                "Capacete de segurança, botas com biqueira, colete refletivo, luvas de proteção, protetor auricular."
            }
            JobCategory::Electrical => {
                "EPIs dielétricos (não condutivos), capacete classe B, vestimenta retardante de chama (classe de risco 2), luvas isolantes, botas sem metais."
            }
            JobCategory::Heights => {
                "Cinturão de segurança tipo paraquedista, talabarte, capacete com jugular, botas antiderrapantes, luvas."
            }
            JobCategory::Chemical => {
                "Avental impermeável, luvas de nitrilo ou neoprene, máscara com filtro químico, óculos de ampla visão (goggles), botas impermeáveis."
            }
            JobCategory::Welding => {
                "Máscara de solda (escurecimento automático), avental de raspa, luvas de cano longo (raspa), perneiras, bota de segurança, protetor auricular."
            }
            JobCategory::General => {
                "Óculos de proteção, luvas de vaqueta, botas de segurança, uniforme padrão."
            }
        }
    }
}

impl fmt::Display for JobCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for JobCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        JobCategory::ALL
            .iter()
            .copied()
            .find(|job| job.key().eq_ignore_ascii_case(trimmed) || job.label() == trimmed)
            .ok_or_else(|| {
                let keys = JobCategory::ALL
                    .iter()
                    .map(|j| j.key())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Unknown job category: {}. Use one of: {}", s, keys)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_construction() {
        assert_eq!(JobCategory::default(), JobCategory::Construction);
    }

    #[test]
    fn test_serialize_as_label() {
        let json = serde_json::to_string(&JobCategory::Welding).expect("シリアライズ失敗");
        assert_eq!(json, "\"Soldagem e Corte\"");
    }

    #[test]
    fn test_deserialize_from_label() {
        let job: JobCategory =
            serde_json::from_str("\"Trabalho em Altura (NR-35)\"").expect("デシリアライズ失敗");
        assert_eq!(job, JobCategory::Heights);
    }

    #[test]
    fn test_deserialize_unknown_label_fails() {
        let result = serde_json::from_str::<JobCategory>("\"Mineração\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_str_key_and_label() {
        assert_eq!("welding".parse::<JobCategory>().unwrap(), JobCategory::Welding);
        assert_eq!("ELECTRICAL".parse::<JobCategory>().unwrap(), JobCategory::Electrical);
        assert_eq!(
            "Manipulação Química".parse::<JobCategory>().unwrap(),
            JobCategory::Chemical
        );
        let err = "diving".parse::<JobCategory>().unwrap_err();
        assert!(err.contains("construction"));
    }

    #[test]
    fn test_every_category_has_requirements() {
        for job in JobCategory::ALL {
            assert!(!job.requirements().is_empty(), "{:?} sem requisitos", job);
            assert!(job.requirements().ends_with('.'));
        }
    }
}
