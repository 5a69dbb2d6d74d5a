use std::marker::PhantomData;

pub trait Stage<In: Send, Out: Send> {
    fn process<C>(&mut self, data: In, collector: &mut C)
    where
        C: OutputCollector<Out>;
}

pub trait OutputCollector<T> {
    fn push(&mut self, item: T);
}

impl<T, F> OutputCollector<T> for F
where
    F: FnMut(T),
{
    #[inline(always)]
    fn push(&mut self, item: T) {
        (self)(item);
    }
}

impl<F, In, Out> Stage<In, Out> for F
where
    F: FnMut(In) -> Option<Out>,
    In: Send,
    Out: Send,
{
    #[inline(always)]
    fn process<C>(&mut self, data: In, collector: &mut C)
    where
        C: OutputCollector<Out>,
    {
        if let Some(out) = (self)(data) {
            collector.push(out);
        }
    }
}

pub struct Pipeline<S1, S2, In, Mid, Out> {
    s1: S1,
    s2: S2,
    _phantom: PhantomData<(In, Mid, Out)>,
}

impl<In, Mid, Out, S1, S2> Stage<In, Out> for Pipeline<S1, S2, In, Mid, Out>
where
    In: Send,
    Mid: Send,
    Out: Send,
    S1: Stage<In, Mid>,
    S2: Stage<Mid, Out>,
{
    #[inline(always)]
    fn process<C>(&mut self, data: In, collector: &mut C)
    where
        C: OutputCollector<Out>,
    {
        let s2 = &mut self.s2;
        self.s1.process(data, &mut |mid: Mid| {
            s2.process(mid, collector);
        });
    }
}

pub trait StageExt<In: Send, Mid: Send>: Stage<In, Mid> {
    #[inline(always)]
    fn pipe<Out: Send, S2: Stage<Mid, Out>>(self, s2: S2) -> Pipeline<Self, S2, In, Mid, Out>
    where
        Self: Sized,
    {
        Pipeline {
            s1: self,
            s2,
            _phantom: PhantomData,
        }
    }
}

impl<S, In, Mid> StageExt<In, Mid> for S
where
    In: Send,
    Mid: Send,
    S: Stage<In, Mid>,
{
}
