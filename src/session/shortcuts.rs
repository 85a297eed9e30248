use crate::core::app::Msg;
use cosmic::iced::keyboard::{Key, Modifiers, key::Named};

/// Which surface currently has keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutContext {
    /// Overlay surfaces are up
    Selecting,
    /// Capture or recognition in progress, nothing on screen takes input
    Busy,
    /// Result card is shown
    Presenting,
}

pub fn handle_key_event(context: ShortcutContext, key: &Key, modifiers: Modifiers) -> Option<Msg> {
    match (context, key) {
        (ShortcutContext::Selecting, Key::Named(Named::Escape)) => Some(Msg::Cancel),
        (ShortcutContext::Presenting, Key::Named(Named::Escape | Named::Enter)) => {
            Some(Msg::Close)
        }
        (ShortcutContext::Presenting, Key::Character(c))
            if c.as_str() == "c" && modifiers.control() =>
        {
            Some(Msg::CopyResult)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(n: Named) -> Key {
        Key::Named(n)
    }

    #[test]
    fn test_escape_cancels_selection() {
        let msg = handle_key_event(
            ShortcutContext::Selecting,
            &named(Named::Escape),
            Modifiers::empty(),
        );
        assert!(matches!(msg, Some(Msg::Cancel)));
    }

    #[test]
    fn test_other_keys_ignored_while_selecting() {
        let msg = handle_key_event(
            ShortcutContext::Selecting,
            &named(Named::Enter),
            Modifiers::empty(),
        );
        assert!(msg.is_none());
    }

    #[test]
    fn test_escape_and_enter_close_result() {
        for key in [Named::Escape, Named::Enter] {
            let msg = handle_key_event(ShortcutContext::Presenting, &named(key), Modifiers::empty());
            assert!(matches!(msg, Some(Msg::Close)));
        }
    }

    #[test]
    fn test_ctrl_c_copies_result() {
        let key = Key::Character("c".into());
        assert!(matches!(
            handle_key_event(ShortcutContext::Presenting, &key, Modifiers::CTRL),
            Some(Msg::CopyResult)
        ));
        assert!(handle_key_event(ShortcutContext::Presenting, &key, Modifiers::empty()).is_none());
    }

    #[test]
    fn test_keys_ignored_while_busy() {
        let msg = handle_key_event(ShortcutContext::Busy, &named(Named::Escape), Modifiers::empty());
        assert!(msg.is_none());
    }
}
