use ratatui::style::Color;
use std::cell::Cell;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Palette {
    pub primary_text: Color,
    pub secondary_text: Color,
    pub tertiary: Color,
    pub title: Color,
    pub background: Color,
    pub contrast_background: Color,
    pub more_contrast_background: Color,
}

pub const BASE: Palette = Palette {
    primary_text: Color::Rgb(226, 232, 240),
    secondary_text: Color::Rgb(140, 156, 178),
    tertiary: Color::Rgb(52, 211, 153),
    title: Color::White,
    background: Color::Rgb(9, 15, 25),
    contrast_background: Color::Rgb(16, 27, 44),
    more_contrast_background: Color::Rgb(24, 36, 58),
};

thread_local! {
    static ACTIVE: Cell<Palette> = const { Cell::new(BASE) };
}

/// The palette in effect on this thread.
pub fn palette() -> Palette {
    ACTIVE.with(Cell::get)
}

/// Makes `accent` the tertiary color until the returned guard drops, which
/// restores whatever palette was active before, nested pushes included.
#[must_use = "the accent is popped as soon as the guard drops"]
pub fn push_accent(accent: Color) -> AccentGuard {
    let previous = ACTIVE.with(|active| {
        let previous = active.get();
        active.set(Palette {
            tertiary: accent,
            ..previous
        });
        previous
    });
    AccentGuard { previous }
}

pub struct AccentGuard {
    previous: Palette,
}

impl Drop for AccentGuard {
    fn drop(&mut self) {
        let previous = self.previous;
        ACTIVE.with(|active| active.set(previous));
    }
}

#[cfg(test)]
mod tests {
    use super::{BASE, palette, push_accent};
    use ratatui::style::Color;

    #[test]
    fn nested_accents_restore_in_reverse_order() {
        assert_eq!(palette(), BASE);
        {
            let _lambda = push_accent(Color::Rgb(251, 146, 60));
            {
                let _alarms = push_accent(Color::Red);
                assert_eq!(palette().tertiary, Color::Red);
            }
            assert_eq!(palette().tertiary, Color::Rgb(251, 146, 60));
            assert_eq!(palette().background, BASE.background);
        }
        assert_eq!(palette(), BASE);
    }

    #[test]
    fn accent_is_restored_when_a_render_panics() {
        let outcome = std::panic::catch_unwind(|| {
            let _guard = push_accent(Color::Blue);
            panic!("render failed");
        });
        assert!(outcome.is_err());
        assert_eq!(palette(), BASE);
    }
}
