//! 安全監査報告書（Laudo）のPDF描画

use crate::capture::decode_data_url;
use crate::cli::PdfQuality;
use crate::error::{Result, SafeScanError};
use printpdf::{
    BuiltinFont, Color, Image as PdfImage, ImageTransform, IndirectFontRef, Line, Mm,
    PdfDocument, PdfDocumentReference, PdfLayerReference, Point, Rgb,
};
use safescan_common::export::report_core::{
    Marker, ReportDocument, Tone, FOOTER_LEFT, LEGAL_NOTE, PRODUCT_NAME, PRODUCT_SUBTITLE,
    REPORT_NORMS, REPORT_TITLE, SIGNATURES,
};
use safescan_common::ReportLayout;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, warn};

/// 埋め込み画像のDPI
const IMAGE_DPI: f32 = 300.0;
/// Helveticaの平均文字幅（フォントサイズ比）
const AVG_CHAR_WIDTH: f32 = 0.5;
const PT_TO_MM: f32 = 25.4 / 72.0;

const TEXT_DARK: (f32, f32, f32) = (0.059, 0.090, 0.165);
const TEXT_MUTED: (f32, f32, f32) = (0.392, 0.455, 0.545);
const RULE: (f32, f32, f32) = (0.796, 0.835, 0.882);

fn color((r, g, b): (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

/// 幅（mm）とフォントサイズから1行の最大文字数を概算
fn chars_per_line(width_mm: f32, font_size: f32) -> usize {
    let char_mm = font_size * AVG_CHAR_WIDTH * PT_TO_MM;
    ((width_mm / char_mm).floor() as usize).max(1)
}

/// 単語単位の折り返し（長すぎる単語は強制分割）
pub(crate) fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// ページ送りを管理しながら上から下へ書き進める
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    layout: ReportLayout,
    footer_right: String,
    /// 現在位置（PDF座標、下からのmm）
    y: f32,
    page_number: usize,
}

impl<'a> PageWriter<'a> {
    fn left(&self) -> f32 {
        self.layout.margin_left_mm
    }

    fn right(&self) -> f32 {
        self.layout.page_width_mm - self.layout.margin_right_mm
    }

    fn width(&self) -> f32 {
        self.layout.content_width_mm()
    }

    fn draw_footer(&self) {
        let y = self.layout.margin_bottom_mm / 2.0;
        self.layer.set_fill_color(color(TEXT_MUTED));
        self.layer.use_text(FOOTER_LEFT, 7.0, Mm(self.left()), Mm(y), &self.regular);
        let right_text = format!("{}  |  Página {}", self.footer_right, self.page_number);
        let right_x = self.right() - right_text.chars().count() as f32 * 7.0 * AVG_CHAR_WIDTH * PT_TO_MM;
        self.layer.use_text(right_text, 7.0, Mm(right_x), Mm(y), &self.regular);
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(
            Mm(self.layout.page_width_mm),
            Mm(self.layout.page_height_mm),
            "Layer 1",
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.page_number += 1;
        self.y = self.layout.content_top_mm();
        self.draw_footer();
    }

    /// 残りが足りなければ改ページ
    fn ensure(&mut self, height_mm: f32) {
        if self.y - height_mm < self.layout.content_bottom_mm() {
            debug!("改ページ: page={} y={:.1}", self.page_number, self.y);
            self.new_page();
        }
    }

    fn text_at(&self, text: &str, x: f32, y: f32, size: f32, bold: bool, rgb: (f32, f32, f32)) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.set_fill_color(color(rgb));
        self.layer.use_text(text, size, Mm(x), Mm(y), font);
    }

    /// 1行書いて行送り
    fn line(&mut self, text: &str, size: f32, bold: bool, rgb: (f32, f32, f32)) {
        let height = size * PT_TO_MM * 1.4;
        self.ensure(height);
        self.y -= height;
        self.text_at(text, self.left(), self.y, size, bold, rgb);
    }

    /// 折り返して書く
    fn paragraph(&mut self, text: &str, size: f32, rgb: (f32, f32, f32)) {
        for line in wrap_text(text, chars_per_line(self.width(), size)) {
            self.line(&line, size, false, rgb);
        }
    }

    fn section_title(&mut self, title: &str) {
        self.gap(4.0);
        self.ensure(12.0);
        self.line(title, 10.0, true, TEXT_DARK);
        self.gap(1.0);
        self.rule(0.3);
        self.gap(2.0);
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn rule(&self, thickness: f32) {
        self.layer.set_outline_color(color(RULE));
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(self.left()), Mm(self.y)), false),
                (Point::new(Mm(self.right()), Mm(self.y)), false),
            ],
            is_closed: false,
        });
    }

    fn outline_rect(&self, x: f32, y_top: f32, w: f32, h: f32, rgb: (f32, f32, f32), thickness: f32) {
        self.layer.set_outline_color(color(rgb));
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x), Mm(y_top)), false),
                (Point::new(Mm(x + w), Mm(y_top)), false),
                (Point::new(Mm(x + w), Mm(y_top - h)), false),
                (Point::new(Mm(x), Mm(y_top - h)), false),
            ],
            is_closed: true,
        });
    }
}

/// フォント読み込み。外部TTFが指定されていれば本文・見出しとも同じフォントを使う
fn load_fonts(
    doc: &PdfDocumentReference,
    font_path: Option<&Path>,
) -> Result<(IndirectFontRef, IndirectFontRef)> {
    if let Some(path) = font_path {
        let file = File::open(path)
            .map_err(|e| SafeScanError::PdfGeneration(format!("フォント読み込みエラー {}: {}", path.display(), e)))?;
        let font = doc
            .add_external_font(file)
            .map_err(|e| SafeScanError::PdfGeneration(format!("フォント追加エラー: {:?}", e)))?;
        return Ok((font.clone(), font));
    }

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| SafeScanError::PdfGeneration(format!("フォント追加エラー: {:?}", e)))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| SafeScanError::PdfGeneration(format!("フォント追加エラー: {:?}", e)))?;
    Ok((regular, bold))
}

/// 画像をデコードして品質に応じて縮小
fn prepare_image(data_url: &str, quality: PdfQuality) -> Result<::image::DynamicImage> {
    let (_, bytes) = decode_data_url(data_url)?;
    let img = ::image::load_from_memory(&bytes)
        .map_err(|e| SafeScanError::ImageLoad(format!("画像デコードエラー: {}", e)))?;

    let img = if img.width() > quality.max_width() {
        img.resize(
            quality.max_width(),
            u32::MAX,
            ::image::imageops::FilterType::Triangle,
        )
    } else {
        img
    };

    // アルファ付きPNGもRGBに揃える
    Ok(::image::DynamicImage::ImageRgb8(img.to_rgb8()))
}

/// 証拠写真を枠内に収めて描画し、マーカーを重ねる
fn draw_evidence(writer: &mut PageWriter<'_>, img: &::image::DynamicImage, markers: &[Marker]) {
    let box_w = writer.width();
    let box_h = writer.layout.evidence_height_mm;
    writer.ensure(box_h + 2.0);

    let box_top = writer.y;
    writer.outline_rect(writer.left(), box_top, box_w, box_h, RULE, 0.5);

    // DPI基準の自然サイズから枠内に収まる倍率を求める
    let natural_w = img.width() as f32 / IMAGE_DPI * 25.4;
    let natural_h = img.height() as f32 / IMAGE_DPI * 25.4;
    let scale = (box_w / natural_w).min(box_h / natural_h);
    let img_w = natural_w * scale;
    let img_h = natural_h * scale;
    let img_x = writer.left() + (box_w - img_w) / 2.0;
    let img_top = box_top - (box_h - img_h) / 2.0;

    PdfImage::from_dynamic_image(img).add_to_layer(
        writer.layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(img_x)),
            translate_y: Some(Mm(img_top - img_h)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );

    for marker in markers {
        let x = img_x + marker.rect.left as f32 / 100.0 * img_w;
        let y_top = img_top - marker.rect.top as f32 / 100.0 * img_h;
        let w = marker.rect.width as f32 / 100.0 * img_w;
        let h = marker.rect.height as f32 / 100.0 * img_h;
        writer.outline_rect(x, y_top, w, h, marker.tone.rgb(), 0.8);
        writer.text_at(
            &format!("{}. {}", marker.index + 1, marker.name),
            x + 0.8,
            y_top - 3.0,
            6.0,
            true,
            marker.tone.rgb(),
        );
    }

    writer.y = box_top - box_h;
}

/// 報告書PDFを生成
pub fn generate_report_pdf(
    report: &ReportDocument,
    output_path: &Path,
    quality: PdfQuality,
    font_path: Option<&Path>,
) -> Result<()> {
    let layout = ReportLayout::a4();
    let (doc, page1, layer1) = PdfDocument::new(
        format!("{} - {}", REPORT_TITLE, report.meta.protocol),
        Mm(layout.page_width_mm),
        Mm(layout.page_height_mm),
        "Layer 1".to_string(),
    );
    let (regular, bold) = load_fonts(&doc, font_path)?;

    let mut writer = PageWriter {
        doc: &doc,
        layer: doc.get_page(page1).get_layer(layer1),
        regular,
        bold,
        y: layout.content_top_mm(),
        layout,
        footer_right: report.footer_reference(),
        page_number: 1,
    };
    writer.draw_footer();

    // ヘッダー
    writer.line(PRODUCT_NAME, 16.0, true, TEXT_DARK);
    writer.line(PRODUCT_SUBTITLE, 8.0, false, TEXT_MUTED);
    let right_x = writer.right() - 55.0;
    writer.text_at(
        &format!("Documento Nº: {}", report.meta.protocol),
        right_x,
        writer.y + 6.0,
        8.0,
        true,
        TEXT_DARK,
    );
    writer.text_at(
        &format!("Emissão: {}", report.meta.issued_at),
        right_x,
        writer.y,
        8.0,
        false,
        TEXT_MUTED,
    );
    writer.gap(3.0);
    writer.rule(1.0);
    writer.gap(6.0);

    writer.line(REPORT_TITLE, 14.0, true, TEXT_DARK);
    writer.line(REPORT_NORMS, 8.0, false, TEXT_MUTED);

    // 基本データ
    writer.section_title("1. Identificação da Atividade");
    writer.paragraph(&format!("Setor / Atividade: {}", report.job_context), 9.0, TEXT_DARK);
    writer.line(&format!("Categoria de Risco: {}", report.job.label()), 9.0, false, TEXT_DARK);
    writer.line(
        &format!(
            "Trabalhador Identificado: {}",
            if report.worker_detected { "Sim" } else { "Não" }
        ),
        9.0,
        false,
        TEXT_DARK,
    );
    writer.line(
        &format!("Índice de Conformidade: {}", report.score_label),
        10.0,
        true,
        report.score_tone.rgb(),
    );
    writer.line(
        &format!("Parecer Final: {}", report.verdict.label),
        12.0,
        true,
        report.verdict.tone.rgb(),
    );

    // 証拠写真
    writer.section_title("2. Registro Fotográfico de Evidência");
    match &report.image {
        Some(data_url) => match prepare_image(data_url, quality) {
            Ok(img) => {
                draw_evidence(&mut writer, &img, &report.markers);
            }
            Err(e) => {
                warn!("証拠画像を埋め込めません: {}", e);
                writer.line("Imagem de evidência indisponível.", 9.0, false, TEXT_MUTED);
            }
        },
        None => writer.line("Imagem de evidência indisponível.", 9.0, false, TEXT_MUTED),
    }
    writer.gap(1.0);
    writer.line(&report.evidence_caption, 7.0, false, TEXT_MUTED);
    if !report.worker_detected {
        writer.line("TRABALHADOR NÃO DETECTADO NA IMAGEM", 9.0, true, Tone::Critical.rgb());
    }

    // チェックリスト
    writer.section_title("3. Checklist de Equipamentos (NR-06)");
    let columns = writer.layout.checklist_columns_mm();
    let col_x = [
        writer.left(),
        writer.left() + columns[0],
        writer.left() + columns[0] + columns[1],
    ];
    writer.ensure(6.0);
    writer.gap(4.0);
    for (x, header) in col_x.iter().zip(["Equipamento", "Status", "Observação Técnica"]) {
        writer.text_at(header, *x, writer.y, 8.0, true, TEXT_MUTED);
    }
    writer.gap(2.0);
    writer.rule(0.3);

    if report.checklist.is_empty() {
        writer.line("Nenhum equipamento identificado.", 8.0, false, TEXT_MUTED);
    }
    for row in &report.checklist {
        let name_lines = wrap_text(&row.equipment, chars_per_line(columns[0] - 2.0, 8.0));
        let obs_lines = wrap_text(&row.observation, chars_per_line(columns[2], 8.0));
        let rows = name_lines.len().max(obs_lines.len()).max(1);
        let line_h = 8.0 * PT_TO_MM * 1.4;
        let row_h = rows as f32 * line_h + 2.0;

        writer.ensure(row_h);
        let top = writer.y;
        for (i, text) in name_lines.iter().enumerate() {
            writer.text_at(text, col_x[0], top - line_h * (i + 1) as f32, 8.0, true, TEXT_DARK);
        }
        writer.text_at(row.status_label, col_x[1], top - line_h, 8.0, true, row.tone.rgb());
        for (i, text) in obs_lines.iter().enumerate() {
            writer.text_at(text, col_x[2], top - line_h * (i + 1) as f32, 8.0, false, TEXT_DARK);
        }
        writer.y = top - row_h;
        writer.rule(0.2);
    }

    if !report.missing_critical.is_empty() {
        writer.section_title("4. EPIs Críticos Ausentes");
        for item in &report.missing_critical {
            writer.line(&format!("- {}", item), 9.0, true, Tone::Critical.rgb());
        }
    }

    writer.section_title("Normas Regulamentadoras Aplicáveis");
    if report.relevant_nrs.is_empty() {
        writer.line("NR-06", 9.0, true, TEXT_DARK);
    } else {
        writer.paragraph(&report.relevant_nrs.join("  |  "), 9.0, TEXT_DARK);
    }

    writer.section_title("Recomendações Técnicas");
    if report.recommendations.is_empty() {
        writer.line("Nenhuma recomendação adicional.", 9.0, false, TEXT_MUTED);
    }
    for (i, rec) in report.recommendations.iter().enumerate() {
        writer.paragraph(&format!("{}. {}", i + 1, rec), 9.0, TEXT_DARK);
    }

    writer.gap(4.0);
    writer.paragraph(LEGAL_NOTE, 7.0, TEXT_MUTED);

    // 署名欄
    writer.gap(6.0);
    writer.ensure(28.0);
    writer.gap(18.0);
    let sig_w = (writer.width() - 20.0) / 2.0;
    for (i, sig) in SIGNATURES.iter().enumerate() {
        let x = writer.left() + i as f32 * (sig_w + 20.0);
        if !sig.caption.is_empty() {
            writer.text_at(sig.caption, x, writer.y + 4.0, 7.0, false, TEXT_MUTED);
        }
        writer.layer.set_outline_color(color(TEXT_DARK));
        writer.layer.set_outline_thickness(0.5);
        writer.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x), Mm(writer.y)), false),
                (Point::new(Mm(x + sig_w), Mm(writer.y)), false),
            ],
            is_closed: false,
        });
        writer.text_at(sig.role, x, writer.y - 4.0, 8.0, true, TEXT_DARK);
        writer.text_at(sig.note, x, writer.y - 7.5, 6.5, false, TEXT_MUTED);
    }

    debug!("PDFページ数: {}", writer.page_number);

    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    doc.save(&mut writer)
        .map_err(|e| SafeScanError::PdfGeneration(format!("PDF保存エラー: {:?}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_respects_width() {
        let lines = wrap_text("Uso obrigatório de luvas de raspa durante todo o corte", 20);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 20), "行幅超過: {:?}", lines);
        assert_eq!(lines.join(" "), "Uso obrigatório de luvas de raspa durante todo o corte");
    }

    #[test]
    fn test_wrap_text_splits_long_word() {
        let lines = wrap_text("AAAAAAAAAAAAAAA", 6);
        assert_eq!(lines, vec!["AAAAAA", "AAAAAA", "AAA"]);
    }

    #[test]
    fn test_wrap_text_empty() {
        assert!(wrap_text("   ", 10).is_empty());
    }

    #[test]
    fn test_chars_per_line() {
        // 160mm / (9pt * 0.5 * 0.3528mm) ≒ 100
        let n = chars_per_line(160.0, 9.0);
        assert!((95..=105).contains(&n), "{}", n);
        assert_eq!(chars_per_line(0.1, 12.0), 1);
    }
}
