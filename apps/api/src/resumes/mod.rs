// Resume parsing: upload → text → fields → JSON / export download.
// Text extraction lives in `extraction`, field rules in `fields`.

pub mod handlers;
pub mod pipeline;
