use super::types::ProgressParts;
use crate::error::Result;
use crate::index::request::Request;

/// Anything that can report how far along it is.
pub trait Progress {
    /// What is being worked on, for display.
    fn subject(&self) -> String;

    /// Current counters; an abort below this provider surfaces here.
    fn parts(&self) -> Result<ProgressParts>;
}

impl<T> Progress for Request<T> {
    fn subject(&self) -> String {
        Request::subject(self).to_string()
    }

    fn parts(&self) -> Result<ProgressParts> {
        Request::parts(self)
    }
}

/// Sums the counters of `providers`.
///
/// The total is final only if every provider's total is; no providers at all
/// is an empty, final `(0, 0)`.
pub fn aggregate<'a, P, I>(providers: I) -> Result<ProgressParts>
where
    P: Progress + ?Sized + 'a,
    I: IntoIterator<Item = &'a P>,
{
    let mut sum = ProgressParts::new(0, 0, true);
    for provider in providers {
        let parts = provider.parts()?;
        sum.done += parts.done;
        sum.total += parts.total;
        sum.total_final &= parts.total_final;
    }
    Ok(sum)
}
