pub(crate) mod scan;

pub(crate) use scan::scan;
