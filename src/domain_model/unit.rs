use serde::Deserialize;

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct PageSize(pub u16);

impl PageSize {
    pub const DEFAULT: PageSize = PageSize(10);
    pub const MAX: PageSize = PageSize(100);

    /// Zero falls back to the default, anything above the cap is clamped.
    pub fn clamped(self) -> Self {
        match self.0 {
            0 => Self::DEFAULT,
            n if n > Self::MAX.0 => Self::MAX,
            _ => self,
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}
