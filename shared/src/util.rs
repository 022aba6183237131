/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a random document id (20 alphanumeric chars)
///
/// 与托管文档库的自动 id 形状一致，不暴露顺序
pub fn new_doc_id() -> String {
    use rand::Rng;
    use rand::distributions::Alphanumeric;
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_doc_id_shape() {
        let a = new_doc_id();
        let b = new_doc_id();
        assert_eq!(a.len(), 20);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_now_millis_positive() {
        assert!(now_millis() > 1_704_067_200_000);
    }
}
