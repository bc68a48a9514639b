//! 替换引擎: 把选中的候选项拼接回查询文本

use crate::resolver::FocusState;

const METHOD_TRIPLE: [char; 3] = [' ', ':', ' '];

/// 去掉紧跟在 `" : "` 之后的空格和冒号, 保证不会出现连续两个 `" : "`
pub fn tidy(text: &str) -> String {
    let mut kept: Vec<char> = Vec::with_capacity(text.len());
    for c in text.chars() {
        let after_method = kept.len() >= 3 && kept[kept.len() - 3..] == METHOD_TRIPLE;
        if after_method && (c == ' ' || c == ':') {
            continue;
        }
        kept.push(c);
    }
    kept.into_iter().collect()
}

/// 向下取到最近的字符边界
fn floor_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// 按焦点把 `chosen` 拼接进 `raw`, 返回新文本和新的光标位置
///
/// - 没有锚点: 追加到末尾
/// - 锚点处已有文本: 替换 `next_text` 长度的内容
/// - 锚点处为空: 插入 `chosen + separator`
pub fn apply_replacement(
    raw: &str,
    focus: &FocusState,
    chosen: &str,
    separator: &str,
) -> (String, usize) {
    let anchor = focus.replace_start.filter(|_| focus.show.is_shown());
    let Some(replace_start) = anchor else {
        let text = format!("{}{}{}", raw, chosen, separator);
        let selection = text.len();
        return (text, selection);
    };

    let start = floor_boundary(raw, replace_start);
    let (spliced, selection) = if focus.next_text.is_empty() {
        let inserted = format!("{}{}", chosen, separator);
        let spliced = format!("{}{}{}", &raw[..start], inserted, &raw[start..]);
        (spliced, start + inserted.len())
    } else {
        let end = floor_boundary(raw, start + focus.next_text.len());
        let spliced = format!("{}{}{}", &raw[..start], chosen, &raw[end..]);
        (spliced, start + chosen.len() + 1)
    };

    let mut text = tidy(&spliced);
    if text.len() < selection {
        text.push_str(separator);
    }
    let selection = floor_boundary(&text, selection);
    (text, selection)
}
