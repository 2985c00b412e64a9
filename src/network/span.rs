use std::ops::RangeInclusive;

/// An inclusive, non-empty range of years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YearSpan {
    begin: i32,
    end: i32,
}

impl YearSpan {
    /// Returns `None` when `begin > end`.
    #[must_use]
    pub fn new(begin: i32, end: i32) -> Option<Self> {
        (begin <= end).then_some(Self { begin, end })
    }

    /// Returns the first year.
    #[must_use]
    pub fn begin(&self) -> i32 {
        self.begin
    }

    /// Returns the last year.
    #[must_use]
    pub fn end(&self) -> i32 {
        self.end
    }

    /// Returns `true` if `year` lies in the span.
    #[must_use]
    pub fn contains(&self, year: i32) -> bool {
        (self.begin..=self.end).contains(&year)
    }

    /// Returns every year of the span in order.
    #[must_use]
    pub fn years(&self) -> RangeInclusive<i32> {
        self.begin..=self.end
    }

    /// Years common to both spans, `None` if they are disjoint.
    #[must_use]
    pub fn intersect(&self, other: &YearSpan) -> Option<YearSpan> {
        Self::new(self.begin.max(other.begin), self.end.min(other.end))
    }

    /// Smallest span covering both.
    #[must_use]
    pub fn hull(&self, other: &YearSpan) -> YearSpan {
        Self {
            begin: self.begin.min(other.begin),
            end: self.end.max(other.end),
        }
    }

    /// Span of the given years, `None` if there are none.
    #[must_use]
    pub fn enclosing<I: IntoIterator<Item = i32>>(years: I) -> Option<YearSpan> {
        years.into_iter().fold(None, |span: Option<YearSpan>, year| {
            Some(match span {
                Some(s) => Self {
                    begin: s.begin.min(year),
                    end: s.end.max(year),
                },
                None => Self {
                    begin: year,
                    end: year,
                },
            })
        })
    }
}

/// Years a mode is operated on its edges.
///
/// A bound is `None` when it is unknown: no edges at all, or, for the upper
/// bound, at least one edge still in service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeSpan {
    pub begin: Option<i32>,
    pub end: Option<i32>,
}

impl EdgeSpan {
    /// Folds edge windows `(year_begin, year_end)` into one span.
    #[must_use]
    pub fn from_windows<I>(windows: I) -> Self
    where
        I: IntoIterator<Item = (i32, Option<i32>)>,
    {
        let mut begin: Option<i32> = None;
        let mut end: Option<i32> = None;
        let mut open_ended = false;
        for (year_begin, year_end) in windows {
            begin = Some(begin.map_or(year_begin, |b| b.min(year_begin)));
            match year_end {
                Some(year_end) => end = Some(end.map_or(year_end, |e| e.max(year_end))),
                None => open_ended = true,
            }
        }
        Self {
            begin,
            end: if open_ended { None } else { end },
        }
    }
}

/// Years a mode can be shown: its speed-sample span narrowed by its edge
/// span. Unknown edge bounds do not narrow anything.
#[must_use]
pub fn effective_span(samples: Option<YearSpan>, edges: EdgeSpan) -> Option<YearSpan> {
    let samples = samples?;
    YearSpan::new(
        edges.begin.map_or(samples.begin, |b| b.max(samples.begin)),
        edges.end.map_or(samples.end, |e| e.min(samples.end)),
    )
}

/// Span of the whole model: the hull of every other mode's effective span,
/// clamped to the reference mode's span.
///
/// With no other usable mode the reference span is used as is.
#[must_use]
pub fn historical_span<I>(reference: YearSpan, others: I) -> Option<YearSpan>
where
    I: IntoIterator<Item = YearSpan>,
{
    match others.into_iter().reduce(|a, b| a.hull(&b)) {
        Some(union) => union.intersect(&reference),
        None => Some(reference),
    }
}
