pub mod items;
pub mod monsters;
pub mod skills;

/// Lines shown in the journal when a run begins.
pub fn opening_lines() -> Vec<&'static str> {
    vec![
        "The Palace of Hours lies below.",
        "Slay the Chronotherium and claim its golden hourglass.",
        "Press r to rewind your own timeline.",
    ]
}
