use crate::error::{MacroError, Result};
use crate::events::KeyCode;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Таблица имён клавиш и кодов evdev.
///
/// Первое имя в каждой строке каноническое: его возвращает `name_of`,
/// остальные считаются псевдонимами при разборе конфигурации.
const KEY_TABLE: &[(u16, &[&str])] = &[
    // Буквенные клавиши
    (30, &["a"]), (48, &["b"]), (46, &["c"]), (32, &["d"]), (18, &["e"]),
    (33, &["f"]), (34, &["g"]), (35, &["h"]), (23, &["i"]), (36, &["j"]),
    (37, &["k"]), (38, &["l"]), (50, &["m"]), (49, &["n"]), (24, &["o"]),
    (25, &["p"]), (16, &["q"]), (19, &["r"]), (31, &["s"]), (20, &["t"]),
    (22, &["u"]), (47, &["v"]), (17, &["w"]), (45, &["x"]), (21, &["y"]),
    (44, &["z"]),

    // Цифровые клавиши (верхний ряд)
    (2, &["1"]), (3, &["2"]), (4, &["3"]), (5, &["4"]), (6, &["5"]),
    (7, &["6"]), (8, &["7"]), (9, &["8"]), (10, &["9"]), (11, &["0"]),

    // Специальные клавиши
    (57, &["space"]),
    (28, &["enter", "return"]),
    (1, &["escape", "esc"]),
    (14, &["backspace"]),
    (15, &["tab"]),
    (12, &["minus"]),
    (13, &["equal"]),

    // Навигация/редакция
    (110, &["insert", "ins"]),
    (111, &["delete", "del"]),
    (102, &["home"]),
    (107, &["end"]),
    (104, &["pageup", "page up", "pgup", "prior"]),
    (109, &["pagedown", "page down", "pgdn", "next"]),
    (103, &["up"]),
    (108, &["down"]),
    (105, &["left"]),
    (106, &["right"]),

    // Системные
    (99, &["printscreen", "sysrq"]),
    (70, &["scrolllock"]),
    (119, &["pause"]),

    // Numpad
    (82, &["kp0"]), (79, &["kp1"]), (80, &["kp2"]), (81, &["kp3"]), (75, &["kp4"]),
    (76, &["kp5"]), (77, &["kp6"]), (71, &["kp7"]), (72, &["kp8"]), (73, &["kp9"]),
    (78, &["kpadd", "kpplus"]),
    (74, &["kpsubtract", "kpminus"]),
    (55, &["kpmultiply", "kpasterisk"]),
    (98, &["kpdivide", "kpslash"]),
    (96, &["kpenter"]),

    // Функциональные клавиши
    (59, &["f1"]), (60, &["f2"]), (61, &["f3"]), (62, &["f4"]),
    (63, &["f5"]), (64, &["f6"]), (65, &["f7"]), (66, &["f8"]),
    (67, &["f9"]), (68, &["f10"]), (87, &["f11"]), (88, &["f12"]),

    // Модификаторы
    (29, &["leftctrl"]), (97, &["rightctrl"]),
    (56, &["leftalt"]), (100, &["rightalt"]),
    (42, &["leftshift"]), (54, &["rightshift"]),
    (125, &["leftmeta"]), (126, &["rightmeta"]),
];

static NAME_TO_CODE: Lazy<HashMap<&'static str, u16>> = Lazy::new(|| {
    KEY_TABLE
        .iter()
        .flat_map(|(code, names)| names.iter().map(move |name| (*name, *code)))
        .collect()
});

static CODE_TO_NAME: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    KEY_TABLE
        .iter()
        .map(|(code, names)| (*code, names[0]))
        .collect()
});

/// Преобразование имён клавиш в evdev коды и обратно
pub struct KeyNames;

impl KeyNames {
    /// Получить evdev код клавиши по её имени (регистр не важен)
    pub fn code_of(key_name: &str) -> Result<KeyCode> {
        let normalized = key_name.trim().to_lowercase();
        NAME_TO_CODE
            .get(normalized.as_str())
            .map(|code| KeyCode::new(*code))
            .ok_or_else(|| MacroError::InvalidKey(key_name.to_string()))
    }

    /// Каноническое имя клавиши по evdev коду
    pub fn name_of(keycode: u16) -> Option<&'static str> {
        CODE_TO_NAME.get(&keycode).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macro_keys_resolve() {
        assert_eq!(KeyNames::code_of("e").unwrap(), KeyCode::new(18));
        assert_eq!(KeyNames::code_of("C").unwrap(), KeyCode::new(46));
        assert_eq!(KeyNames::code_of("z").unwrap(), KeyCode::new(44));
    }

    #[test]
    fn test_aliases_share_canonical_name() {
        let pgup = KeyNames::code_of("PgUp").unwrap();
        assert_eq!(pgup, KeyNames::code_of("page up").unwrap());
        assert_eq!(KeyNames::name_of(pgup.value()), Some("pageup"));
        assert_eq!(KeyNames::name_of(1), Some("escape"));
    }

    #[test]
    fn test_unknown_key() {
        assert!(matches!(
            KeyNames::code_of("hyper"),
            Err(MacroError::InvalidKey(name)) if name == "hyper"
        ));
        assert_eq!(KeyNames::name_of(0), None);
    }

    #[test]
    fn test_table_has_no_duplicate_names() {
        let total: usize = KEY_TABLE.iter().map(|(_, names)| names.len()).sum();
        assert_eq!(total, NAME_TO_CODE.len());
        assert_eq!(KEY_TABLE.len(), CODE_TO_NAME.len());
    }
}
