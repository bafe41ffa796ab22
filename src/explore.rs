use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Days in a leap year; `day_of_year` is 1-based.
pub const MAX_DAY_OF_YEAR: u32 = 366;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExploreError {
    #[error("page must be at least 1 (got {0})")]
    InvalidPage(u32),
    #[error("page size must be at least 1 (got {0})")]
    InvalidPageSize(u32),
    #[error("day of year must be between 1 and 366 (got {0})")]
    InvalidDayOfYear(u32),
}

/// One explore-feed page request for a given caller on a given day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
    pub user_id: i64,
    pub day_of_year: u32,
}

impl PageRequest {
    pub fn new(
        page: u32,
        page_size: u32,
        user_id: i64,
        day_of_year: u32,
    ) -> Result<Self, ExploreError> {
        let request = Self {
            page,
            page_size,
            user_id,
            day_of_year,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), ExploreError> {
        if self.page < 1 {
            return Err(ExploreError::InvalidPage(self.page));
        }
        if self.page_size < 1 {
            return Err(ExploreError::InvalidPageSize(self.page_size));
        }
        if !(1..=MAX_DAY_OF_YEAR).contains(&self.day_of_year) {
            return Err(ExploreError::InvalidDayOfYear(self.day_of_year));
        }
        Ok(())
    }

    /// `day_of_year * 1000 + user_id + page`
    pub fn seed(&self) -> i64 {
        i64::from(self.day_of_year)
            .wrapping_mul(1000)
            .wrapping_add(self.user_id)
            .wrapping_add(i64::from(self.page))
    }

    /// Index of the first item on this page, or `None` if it does not fit in `usize`.
    pub fn offset(&self) -> Option<usize> {
        let page = usize::try_from(self.page.saturating_sub(1)).ok()?;
        let size = usize::try_from(self.page_size).ok()?;
        page.checked_mul(size)
    }
}

/// Returns one page of `eligible` in a seeded, reproducible order.
///
/// Every call shuffles the whole eligible set with a generator built from
/// [`PageRequest::seed`], so the same caller gets the same page back for the
/// whole day. Pages are cut from independent permutations (the seed includes
/// the page number), which means neighbouring pages may share items.
///
/// When the whole set fits on one page it is returned shuffled, whatever page
/// was asked for. An offset past the end yields an empty page.
pub fn paginate<T>(mut eligible: Vec<T>, request: &PageRequest) -> Result<Vec<T>, ExploreError> {
    request.validate()?;

    let page_size = request.page_size as usize;
    let mut rng = ChaCha8Rng::seed_from_u64(request.seed() as u64);

    if eligible.len() <= page_size {
        eligible.shuffle(&mut rng);
        return Ok(eligible);
    }

    let offset = match request.offset() {
        Some(offset) if offset < eligible.len() => offset,
        _ => return Ok(Vec::new()),
    };

    eligible.shuffle(&mut rng);
    let end = offset.saturating_add(page_size).min(eligible.len());
    eligible.truncate(end);
    Ok(eligible.split_off(offset))
}
