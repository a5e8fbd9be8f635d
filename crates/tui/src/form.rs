use gamecat_core::GameDraft;

const MAX_FIELD_LEN: usize = 120;

/// Which record form is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Create,
    Edit,
}

impl FormKind {
    pub fn title(self) -> &'static str {
        match self {
            FormKind::Create => "Add Game",
            FormKind::Edit => "Edit Game",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    ReleaseDate,
    Rating,
    Genre,
    Platform,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::Title,
        FormField::ReleaseDate,
        FormField::Rating,
        FormField::Genre,
        FormField::Platform,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::ReleaseDate => "Release date",
            FormField::Rating => "Rating",
            FormField::Genre => "Genre",
            FormField::Platform => "Platform",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            FormField::ReleaseDate => "YYYY-MM-DD",
            FormField::Rating => "0-100",
            _ => "",
        }
    }

    pub fn value(self, draft: &GameDraft) -> &str {
        match self {
            FormField::Title => &draft.title,
            FormField::ReleaseDate => &draft.release_date,
            FormField::Rating => &draft.rating,
            FormField::Genre => &draft.genre,
            FormField::Platform => &draft.platform,
        }
    }

    pub fn value_mut(self, draft: &mut GameDraft) -> &mut String {
        match self {
            FormField::Title => &mut draft.title,
            FormField::ReleaseDate => &mut draft.release_date,
            FormField::Rating => &mut draft.rating,
            FormField::Genre => &mut draft.genre,
            FormField::Platform => &mut draft.platform,
        }
    }

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|field| *field == self)
            .unwrap_or_default()
    }

    fn offset(self, delta: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let idx = (self.index() as isize + delta).rem_euclid(len);
        Self::ALL[idx as usize]
    }
}

/// Focused field plus a cursor counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormFocus {
    pub field: FormField,
    pub cursor: usize,
}

impl FormFocus {
    /// Focus the first field with the cursor at the end of its text.
    pub fn start(draft: &GameDraft) -> Self {
        let field = FormField::Title;
        Self {
            field,
            cursor: field.value(draft).chars().count(),
        }
    }

    pub fn next_field(&mut self, draft: &GameDraft) {
        self.focus(self.field.offset(1), draft);
    }

    pub fn prev_field(&mut self, draft: &GameDraft) {
        self.focus(self.field.offset(-1), draft);
    }

    fn focus(&mut self, field: FormField, draft: &GameDraft) {
        self.field = field;
        self.cursor = field.value(draft).chars().count();
    }

    pub fn move_cursor(&mut self, delta: isize, draft: &GameDraft) {
        let len = self.field.value(draft).chars().count() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self, draft: &GameDraft) {
        self.cursor = self.field.value(draft).chars().count();
    }

    pub fn insert(&mut self, ch: char, draft: &mut GameDraft) {
        if ch.is_control() {
            return;
        }
        let text = self.field.value_mut(draft);
        if text.chars().count() >= MAX_FIELD_LEN {
            return;
        }
        let at = byte_offset(text, self.cursor);
        text.insert(at, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self, draft: &mut GameDraft) {
        if self.cursor == 0 {
            return;
        }
        let text = self.field.value_mut(draft);
        let at = byte_offset(text, self.cursor - 1);
        if at < text.len() {
            text.remove(at);
            self.cursor -= 1;
        }
    }

    pub fn delete(&mut self, draft: &mut GameDraft) {
        let text = self.field.value_mut(draft);
        let at = byte_offset(text, self.cursor);
        if at < text.len() {
            text.remove(at);
        }
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}
