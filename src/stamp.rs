//! 記録ID・日時の発行

use chrono::Local;
use rand::distributions::Alphanumeric;
use rand::Rng;
use safescan_common::{RecordStamp, StampSource};

/// IDの長さ
const ID_LEN: usize = 7;

/// 短いランダムID（大文字英数字、暗号学的な一意性はない）
pub fn short_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect::<String>()
        .to_uppercase()
}

/// 現在時刻（pt-BR形式: "17/10/2026, 14:03:22"）
pub fn now_label() -> String {
    Local::now().format("%d/%m/%Y, %H:%M:%S").to_string()
}

/// 現在時刻（UNIXミリ秒）
pub fn now_millis() -> i64 {
    Local::now().timestamp_millis()
}

/// システム時計と乱数によるスタンプ
#[derive(Debug, Default, Clone, Copy)]
pub struct ClockStamps;

impl StampSource for ClockStamps {
    fn next_stamp(&self) -> RecordStamp {
        RecordStamp {
            id: short_id(),
            timestamp: now_label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_shape() {
        let id = short_id();
        assert_eq!(id.len(), ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_now_label_shape() {
        let label = now_label();
        // dd/mm/yyyy, HH:MM:SS
        assert_eq!(label.len(), 20);
        assert_eq!(&label[2..3], "/");
        assert_eq!(&label[10..12], ", ");
    }

    #[test]
    fn test_clock_stamps_differ() {
        let stamps = ClockStamps;
        assert_ne!(stamps.next_stamp().id, stamps.next_stamp().id);
    }
}
