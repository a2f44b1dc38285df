//! プロンプト生成モジュール
//!
//! 解析リクエストで送る固定のシステム指示・作業区分別プロンプト・
//! レスポンススキーマを定義する。

use crate::job::JobCategory;
use serde_json::{json, Value};

/// システム指示（専門家としての役割付けと出力スキーマの強制）
pub const ANALYSIS_SYSTEM_INSTRUCTION: &str = r#"Você é um Engenheiro de Segurança do Trabalho especialista em Visão Computacional e NRs brasileiras.
Sua tarefa é analisar fotos de trabalhadores e detectar EPIs com precisão cirúrgica.

REGRAS DE OURO:
1. Identifique o trabalhador e cada item de EPI.
2. Para cada item identificado (ou ausente mas detectado o local onde deveria estar), forneça a localização no formato [ymin, xmin, ymax, xmax] usando coordenadas normalizadas de 0 a 1000.
3. Se um item está ausente (ex: falta capacete), aponte a localização da cabeça do trabalhador.
4. Status: 'present' (detectado e correto), 'missing' (obrigatório mas não detectado), 'incorrect' (detectado mas usado de forma errada, ex: capacete sem jugular).

RESPOSTA JSON OBRIGATÓRIA:
{
  "workerDetected": boolean,
  "jobContext": string,
  "identifiedPPE": [
    {
      "name": string,
      "status": "present"|"missing"|"incorrect",
      "observation": string,
      "location": [number, number, number, number]
    }
  ],
  "missingCriticalPPE": [string],
  "complianceScore": number,
  "relevantNRs": [string],
  "finalVerdict": "approved"|"restricted"|"critical",
  "recommendations": [string]
}"#;

/// トップレベルの必須フィールド（スキーマとパーサーで共有）
pub const REQUIRED_FIELDS: &[&str] = &[
    "workerDetected",
    "jobContext",
    "identifiedPPE",
    "missingCriticalPPE",
    "complianceScore",
    "relevantNRs",
    "finalVerdict",
    "recommendations",
];

/// 作業区分別の解析プロンプト生成
///
/// # Arguments
/// * `job` - 選択された作業区分
///
/// # Returns
/// 区分名と必須EPIチェックリストを含むプロンプト文字列
pub fn build_analysis_prompt(job: JobCategory) -> String {
    let label = job.label();
    let requirements = job.requirements();

    format!(
        r#"DETERMINAÇÃO TÉCNICA:
Atue como Perito de Segurança do Trabalho. Analise esta imagem sob a ótica da NR-01, NR-06 e a específica {label}.

REQUISITOS DO LAUDO:
1. Identifique o trabalhador e mapeie os EPIs com coordenadas [ymin, xmin, ymax, xmax].
2. Cite explicitamente itens e alíneas das NRs.
3. Avalie o estado de conservação aparente.
4. Gere recomendações baseadas na hierarquia de controle de riscos.

CONDIÇÕES DE TRABALHO PARA {label}: {requirements}"#
    )
}

/// レスポンススキーマ（Gemini `responseSchema` 形式）
pub fn response_schema() -> Value {
    let string_array = json!({ "type": "ARRAY", "items": { "type": "STRING" } });

    json!({
        "type": "OBJECT",
        "properties": {
            "workerDetected": { "type": "BOOLEAN" },
            "jobContext": { "type": "STRING" },
            "identifiedPPE": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "status": { "type": "STRING" },
                        "observation": { "type": "STRING" },
                        "location": { "type": "ARRAY", "items": { "type": "NUMBER" } }
                    },
                    "required": ["name", "status", "observation", "location"]
                }
            },
            "missingCriticalPPE": string_array.clone(),
            "complianceScore": { "type": "NUMBER" },
            "relevantNRs": string_array.clone(),
            "finalVerdict": { "type": "STRING" },
            "recommendations": string_array
        },
        "required": REQUIRED_FIELDS
    })
}
