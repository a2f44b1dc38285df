//! 報告書レイアウト設定モジュール
//!
//! mm基準のレイアウト定義（Source of Truth）
//! 余白はABNT準拠（上・左 30mm、右・下 20mm）

// ============================================
// mm基準レイアウト
// ============================================

/// A4サイズ（mm）
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

/// 余白（mm）
pub const MARGIN_TOP_MM: f32 = 30.0;
pub const MARGIN_LEFT_MM: f32 = 30.0;
pub const MARGIN_RIGHT_MM: f32 = 20.0;
pub const MARGIN_BOTTOM_MM: f32 = 20.0;

/// 本文幅（mm）
pub const CONTENT_WIDTH_MM: f32 = A4_WIDTH_MM - MARGIN_LEFT_MM - MARGIN_RIGHT_MM; // 160mm

/// 写真エビデンス枠の高さ（mm）
pub const EVIDENCE_HEIGHT_MM: f32 = 80.0;

/// チェックリスト列幅の比率（設備 / 状態 / 所見）
pub const CHECKLIST_COLUMN_RATIOS: [f32; 3] = [0.25, 1.0 / 6.0, 7.0 / 12.0];

// ============================================
// 変換係数
// ============================================

/// mm → pt変換 (1mm = 72/25.4 pt ≈ 2.835pt)
pub const MM_TO_PT: f32 = 72.0 / 25.4;

/// pt → px変換 (96dpi基準)
pub const PT_TO_PX: f32 = 96.0 / 72.0;

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * MM_TO_PT
}

/// mm → px（96dpi）。210mm ≈ 793.7px
pub fn mm_to_px(mm: f32) -> f32 {
    mm_to_pt(mm) * PT_TO_PX
}

/// 報告書ページのレイアウト
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_top_mm: f32,
    pub margin_left_mm: f32,
    pub margin_right_mm: f32,
    pub margin_bottom_mm: f32,
    pub evidence_height_mm: f32,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self::a4()
    }
}

impl ReportLayout {
    pub fn a4() -> Self {
        Self {
            page_width_mm: A4_WIDTH_MM,
            page_height_mm: A4_HEIGHT_MM,
            margin_top_mm: MARGIN_TOP_MM,
            margin_left_mm: MARGIN_LEFT_MM,
            margin_right_mm: MARGIN_RIGHT_MM,
            margin_bottom_mm: MARGIN_BOTTOM_MM,
            evidence_height_mm: EVIDENCE_HEIGHT_MM,
        }
    }

    pub fn content_width_mm(&self) -> f32 {
        self.page_width_mm - self.margin_left_mm - self.margin_right_mm
    }

    /// 本文の上端（PDF座標系、下からの距離）
    pub fn content_top_mm(&self) -> f32 {
        self.page_height_mm - self.margin_top_mm
    }

    /// 本文の下端（PDF座標系）
    pub fn content_bottom_mm(&self) -> f32 {
        self.margin_bottom_mm
    }

    /// チェックリスト各列の幅（mm）
    pub fn checklist_columns_mm(&self) -> [f32; 3] {
        let width = self.content_width_mm();
        CHECKLIST_COLUMN_RATIOS.map(|ratio| width * ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_width() {
        let layout = ReportLayout::a4();
        assert_eq!(layout.content_width_mm(), CONTENT_WIDTH_MM);
        assert_eq!(CONTENT_WIDTH_MM, 160.0);
    }

    #[test]
    fn test_page_width_in_px() {
        let px = mm_to_px(A4_WIDTH_MM);
        assert!((px - 793.7).abs() < 0.1, "A4幅のpx換算が不正: {}", px);
    }

    #[test]
    fn test_checklist_columns_fill_content() {
        let layout = ReportLayout::a4();
        let total: f32 = layout.checklist_columns_mm().iter().sum();
        assert!((total - layout.content_width_mm()).abs() < 0.01);
    }

    #[test]
    fn test_content_bounds() {
        let layout = ReportLayout::a4();
        assert_eq!(layout.content_top_mm(), 267.0);
        assert_eq!(layout.content_bottom_mm(), 20.0);
    }
}
