use std::fmt;

/// The option lists the graph derives from upstream selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Blocks,
    Subjects,
    Instructors,
    Buildings,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Blocks,
        Field::Subjects,
        Field::Instructors,
        Field::Buildings,
    ];
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Blocks => "blocks",
            Field::Subjects => "subjects",
            Field::Instructors => "instructors",
            Field::Buildings => "buildings",
        };
        f.write_str(name)
    }
}

/// Candidate options of one derived list.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldState<T> {
    /// The governing upstream field is empty.
    #[default]
    Unset,
    Loading,
    Ready(Vec<T>),
}

impl<T> FieldState<T> {
    /// Ready options, or nothing.
    pub fn options(&self) -> &[T] {
        match self {
            FieldState::Ready(options) => options,
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FieldState::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, FieldState::Ready(_))
    }
}

/// Where a filter field sits in `Unset → Loading → Ready → Selected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStatus {
    Unset,
    Loading,
    Ready,
    Selected,
}

impl FieldStatus {
    pub(crate) fn of<T>(state: &FieldState<T>, has_selection: bool) -> Self {
        match state {
            FieldState::Unset => FieldStatus::Unset,
            FieldState::Loading => FieldStatus::Loading,
            FieldState::Ready(_) if has_selection => FieldStatus::Selected,
            FieldState::Ready(_) => FieldStatus::Ready,
        }
    }
}

/// Bookkeeping for the derivation currently owning a field.
#[derive(Debug, Default)]
pub(crate) struct Slot {
    pub generation: u64,
    pub token: Option<tokio_util::sync::CancellationToken>,
}

impl Slot {
    /// Cancel whatever is in flight and start a new generation.
    pub fn advance(&mut self) -> u64 {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        self.generation += 1;
        self.generation
    }
}
