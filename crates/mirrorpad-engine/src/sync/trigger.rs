/// Key press as reported by the host, reduced to what save detection needs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyChord {
    pub key: char,
    pub ctrl: bool,
    /// Command key on macOS
    pub meta: bool,
    pub alt: bool,
}

impl KeyChord {
    pub fn ctrl(key: char) -> Self {
        Self {
            key,
            ctrl: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveIntent {
    Button,
    Shortcut,
}

impl SaveIntent {
    /// The host must suppress its own "save page" handling for this intent
    pub fn prevents_default(self) -> bool {
        matches!(self, SaveIntent::Shortcut)
    }
}

/// Turns the save control and `Ctrl+S` / `Cmd+S` into save intents
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveTrigger;

impl SaveTrigger {
    pub fn button(&self) -> SaveIntent {
        SaveIntent::Button
    }

    pub fn on_key(&self, chord: KeyChord) -> Option<SaveIntent> {
        let modifier = chord.ctrl || chord.meta;
        let is_save = modifier && !chord.alt && chord.key.eq_ignore_ascii_case(&'s');
        is_save.then_some(SaveIntent::Shortcut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(KeyChord::ctrl('s'), Some(SaveIntent::Shortcut))]
    #[case(KeyChord::ctrl('S'), Some(SaveIntent::Shortcut))]
    #[case(KeyChord { key: 's', meta: true, ..KeyChord::default() }, Some(SaveIntent::Shortcut))]
    #[case(KeyChord { key: 's', ..KeyChord::default() }, None)]
    #[case(KeyChord { key: 's', ctrl: true, alt: true, ..KeyChord::default() }, None)]
    #[case(KeyChord::ctrl('q'), None)]
    fn test_on_key(#[case] chord: KeyChord, #[case] expected: Option<SaveIntent>) {
        assert_eq!(SaveTrigger.on_key(chord), expected);
    }

    #[test]
    fn test_only_shortcut_prevents_default() {
        assert!(SaveIntent::Shortcut.prevents_default());
        assert!(!SaveTrigger.button().prevents_default());
    }
}
