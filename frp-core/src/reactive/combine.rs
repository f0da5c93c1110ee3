//! Combiners: glitch-free functions of several signals.
//!
//! A combiner keeps one [`Latest`](super::Latest) per parent and a single
//! [`Settle`] counter shared by all of them. When several parents update
//! inside one cascade (typically because they share an ancestor), their
//! windows overlap and the combiner settles once, after the last of them
//! closes. Observers therefore never see a value computed from a mix of
//! pre- and post-update parent states.
//!
//! Nothing is emitted until every parent has produced a value.

use std::rc::Rc;

use tracing::debug;

use super::settle::Settle;
use super::signal::{NodeKind, Signal};
use super::transaction::LatestValue;

macro_rules! combiner {
    ($(#[$doc:meta])* $name:ident, $arity:literal, $($parent:ident: $T:ident),+) => {
        $(#[$doc])*
        pub fn $name<$($T,)+ R, F>($($parent: &Signal<$T>,)+ combine: F) -> Signal<R>
        where
            $($T: Clone + 'static,)+
            R: Clone + 'static,
            F: Fn($($T),+) -> R + 'static,
        {
            $(let $parent = $parent.latest();)+

            let compute: Rc<dyn Fn() -> Option<R>> = {
                $(let $parent = $parent.clone();)+
                Rc::new(move || Some(combine($($parent.value()?),+)))
            };
            let pull = Rc::clone(&compute);
            let combined = Signal::with_pull(NodeKind::Combine, move || {
                LatestValue::Computed(Rc::clone(&pull))
            });

            let settle = Rc::new(Settle::new());
            $(
                {
                    let settle = Rc::clone(&settle);
                    let compute = Rc::clone(&compute);
                    combined.attach($parent.signal(), move |out, transaction| {
                        settle.route(out, transaction, || compute());
                    });
                }
            )+
            debug!(signal = combined.id(), parents = $arity, "combiner created");
            combined
        }
    };
}

combiner!(
    /// Combine two signals with `combine`.
    combine2, 2, a: A, b: B
);
combiner!(
    /// Combine three signals with `combine`.
    combine3, 3, a: A, b: B, c: C
);
combiner!(
    /// Combine four signals with `combine`.
    combine4, 4, a: A, b: B, c: C, d: D
);
combiner!(
    /// Combine five signals with `combine`.
    combine5, 5, a: A, b: B, c: C, d: D, e: E
);
combiner!(
    /// Combine six signals with `combine`.
    combine6, 6, a: A, b: B, c: C, d: D, e: E, g: G
);

impl<T> Signal<T>
where
    T: Clone + 'static,
{
    /// Combine this signal with `other`.
    pub fn combine<U, R, F>(&self, other: &Signal<U>, combine: F) -> Signal<R>
    where
        U: Clone + 'static,
        R: Clone + 'static,
        F: Fn(T, U) -> R + 'static,
    {
        combine2(self, other, combine)
    }
}
