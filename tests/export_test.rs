//! 報告書PDF出力の統合テスト

use safescan::cli::PdfQuality;
use safescan::export::{export_report, pdf, snapshot, BusyFlag, ExportJob, ExportOutcome};
use safescan_common::{JobCategory, PpeItem, PpeStatus, ReportDocument, SafetyAnalysis, Verdict};
use std::io::Cursor;
use tempfile::tempdir;

fn create_test_analysis(worker_detected: bool) -> SafetyAnalysis {
    SafetyAnalysis {
        worker_detected,
        job_context: "Soldador em estrutura metálica".to_string(),
        identified_ppe: vec![
            PpeItem {
                name: "Máscara de solda".to_string(),
                status: PpeStatus::Present,
                observation: "Filtro de luz tonalidade 12, íntegra".to_string(),
                location: Some(vec![80.0, 400.0, 260.0, 600.0]),
            },
            PpeItem {
                name: "Avental de raspa".to_string(),
                status: PpeStatus::Incorrect,
                observation: "Rasgado na altura do abdômen, expondo a roupa comum a respingos".to_string(),
                location: Some(vec![300.0, 350.0, 700.0, 650.0]),
            },
            PpeItem {
                name: "Perneiras".to_string(),
                status: PpeStatus::Missing,
                observation: "Não utilizadas".to_string(),
                location: None,
            },
        ],
        missing_critical_ppe: vec!["Perneiras".to_string()],
        compliance_score: 61.5,
        relevant_nrs: vec!["NR-06".to_string(), "NR-18".to_string(), "NR-34".to_string()],
        final_verdict: Verdict::Critical,
        recommendations: vec![
            "Substituir o avental de raspa imediatamente".to_string(),
            "Fornecer perneiras conforme NR-06".to_string(),
        ],
    }
}

/// テスト用のPNG画像（Data URL）
fn create_test_image(width: u32, height: u32) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine};

    let img = image::RgbImage::from_pixel(width, height, image::Rgb([180, 190, 200]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
        .expect("PNGエンコード失敗");
    format!("data:image/png;base64,{}", STANDARD.encode(&buf))
}

fn create_report(image: Option<&str>, worker_detected: bool) -> ReportDocument {
    snapshot(
        &create_test_analysis(worker_detected),
        image,
        JobCategory::Welding,
        "K3J9QX2",
        "gemini-3-flash-preview",
    )
}

fn assert_pdf(path: &std::path::Path) {
    assert!(path.exists(), "PDFファイルが作成されていない");
    let bytes = std::fs::read(path).expect("PDF読み込み失敗");
    assert!(bytes.starts_with(b"%PDF"), "PDFヘッダーがない");
    println!("PDF size: {} bytes", bytes.len());
}

#[test]
fn test_pdf_generation_with_image() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output_path = dir.path().join("laudo.pdf");
    let image = create_test_image(320, 240);

    let result = pdf::generate_report_pdf(
        &create_report(Some(&image), true),
        &output_path,
        PdfQuality::Medium,
        None,
    );

    assert!(result.is_ok(), "PDF生成に失敗: {:?}", result.err());
    assert_pdf(&output_path);
}

#[test]
fn test_pdf_generation_without_image() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output_path = dir.path().join("sem_imagem.pdf");

    let result = pdf::generate_report_pdf(&create_report(None, true), &output_path, PdfQuality::Low, None);

    assert!(result.is_ok(), "PDF生成に失敗: {:?}", result.err());
    assert_pdf(&output_path);
}

#[test]
fn test_pdf_generation_worker_not_detected() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output_path = dir.path().join("sem_trabalhador.pdf");
    let image = create_test_image(64, 64);

    let result = pdf::generate_report_pdf(
        &create_report(Some(&image), false),
        &output_path,
        PdfQuality::Medium,
        None,
    );

    assert!(result.is_ok(), "PDF生成に失敗: {:?}", result.err());
    assert_pdf(&output_path);
}

#[test]
fn test_pdf_generation_with_broken_image_still_renders() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output_path = dir.path().join("imagem_corrompida.pdf");

    let result = pdf::generate_report_pdf(
        &create_report(Some("data:image/jpeg;base64,AAAA"), true),
        &output_path,
        PdfQuality::Medium,
        None,
    );

    assert!(result.is_ok(), "PDF生成に失敗: {:?}", result.err());
    assert_pdf(&output_path);
}

#[test]
fn test_pdf_quality_settings() {
    let dir = tempdir().expect("Failed to create temp dir");
    let image = create_test_image(1600, 1200);
    let report = create_report(Some(&image), true);

    for quality in [PdfQuality::High, PdfQuality::Medium, PdfQuality::Low] {
        let output_path = dir.path().join(format!("quality_{}.pdf", quality));
        let result = pdf::generate_report_pdf(&report, &output_path, quality, None);
        assert!(result.is_ok(), "品質{}でPDF生成に失敗: {:?}", quality, result.err());
        assert_pdf(&output_path);
    }
}

#[test]
fn test_pdf_generation_many_items_adds_pages() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output_path = dir.path().join("longo.pdf");

    let mut analysis = create_test_analysis(true);
    for i in 0..40 {
        analysis.identified_ppe.push(PpeItem {
            name: format!("Equipamento {}", i),
            status: PpeStatus::Present,
            observation: "Em bom estado de conservação, sem avarias visíveis".to_string(),
            location: None,
        });
    }
    let report = snapshot(&analysis, None, JobCategory::General, "LONG001", "gemini");

    let result = pdf::generate_report_pdf(&report, &output_path, PdfQuality::Low, None);
    assert!(result.is_ok(), "PDF生成に失敗: {:?}", result.err());
    assert_pdf(&output_path);
}

#[test]
fn test_export_report_file_name() {
    let dir = tempdir().expect("Failed to create temp dir");

    let path = export_report(&create_report(None, true), dir.path(), PdfQuality::Low, None)
        .expect("出力失敗");

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("LAUDO_TECNICO_SOLDADOR_EM_"), "ファイル名: {}", name);
    assert!(name.ends_with(".pdf"));
    assert_eq!(path.parent().unwrap(), dir.path());
    assert_pdf(&path);
}

#[test]
fn test_export_report_missing_font_fails() {
    let dir = tempdir().expect("Failed to create temp dir");
    let missing_font = dir.path().join("nao_existe.ttf");

    let result = export_report(
        &create_report(None, true),
        dir.path(),
        PdfQuality::Low,
        Some(&missing_font),
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn test_export_job_success_releases_busy_flag() {
    let dir = tempdir().expect("Failed to create temp dir");
    let job = ExportJob::new();

    let outcome = job
        .run(create_report(None, true), dir.path().to_path_buf(), PdfQuality::Low, None)
        .await
        .expect("出力が実行されていない");

    match outcome {
        ExportOutcome::Saved(path) => assert_pdf(&path),
        ExportOutcome::Failed(e) => panic!("出力失敗: {}", e),
    }
    assert!(!job.busy().is_busy());
}

#[tokio::test]
async fn test_export_job_failure_releases_busy_flag() {
    let dir = tempdir().expect("Failed to create temp dir");
    let job = ExportJob::new();

    let outcome = job
        .run(
            create_report(None, true),
            dir.path().to_path_buf(),
            PdfQuality::Low,
            Some(dir.path().join("nao_existe.ttf")),
        )
        .await
        .expect("出力が実行されていない");

    assert!(matches!(outcome, ExportOutcome::Failed(_)));
    assert!(!job.busy().is_busy(), "失敗後もフラグが残っている");
}

#[tokio::test]
async fn test_export_job_ignored_while_busy() {
    let dir = tempdir().expect("Failed to create temp dir");
    let job = ExportJob::new();
    let flag: &BusyFlag = job.busy();

    let _guard = flag.try_acquire().expect("フラグ取得失敗");
    let outcome = job
        .run(create_report(None, true), dir.path().to_path_buf(), PdfQuality::Low, None)
        .await;

    assert!(outcome.is_none(), "出力中に二重実行された");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
