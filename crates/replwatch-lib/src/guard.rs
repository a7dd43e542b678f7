/// A user-editable text field that the tick refreshes from the namespace.
///
/// While `editing` is set the refresh is skipped so a periodic tick cannot
/// clobber a keystroke in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditField {
    text: String,
    editing: bool,
}

impl EditField {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// User typed into the field.
    pub fn edit(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.editing = true;
    }

    /// Tick-driven refresh. Returns whether the displayed text changed.
    pub fn refresh(&mut self, text: impl Into<String>) -> bool {
        if self.editing {
            return false;
        }
        let text = text.into();
        if self.text == text {
            return false;
        }
        self.text = text;
        true
    }

    /// Confirm the edit and hand back the typed text for parsing.
    pub fn commit(&mut self) -> String {
        self.editing = false;
        self.text.clone()
    }

    pub fn cancel(&mut self) {
        self.editing = false;
    }
}

/// Parse a committed integer entry bounded to `[min, max]`. Malformed or out of
/// range text yields `None` and the caller keeps its previous state.
pub fn parse_bounded(text: &str, min: i64, max: i64) -> Option<i64> {
    match text.trim().parse::<i64>() {
        Ok(value) if (min..=max).contains(&value) => Some(value),
        Ok(value) => {
            log::debug!("ignoring entry {value}: outside {min}..={max}");
            None
        }
        Err(_) => {
            log::debug!("ignoring non-numeric entry {text:?}");
            None
        }
    }
}
