pub mod net;
pub mod sim;
pub mod te;
pub mod topo;

#[cfg(test)]
mod test;
