//! Deep merge for service trees

use serde_json::Value;

/// `overlay`를 `base`에 병합합니다.
///
/// 객체는 키 단위로 재귀 병합되고, 그 외 값(배열 포함)은 `overlay`가 대체합니다.
/// 같은 입력에 대해 항상 같은 결과를 냅니다.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// 여러 트리를 앞에서부터 순서대로 병합 (`reduce(parts, deep_merge, {})`)
pub fn merge_all<I>(parts: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    parts.into_iter().fold(Value::Object(Default::default()), |mut acc, part| {
        deep_merge(&mut acc, part);
        acc
    })
}
