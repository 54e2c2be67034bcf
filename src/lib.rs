pub mod aodv;
pub mod mac;
pub mod net;
pub mod scenario;
pub mod sim;
pub mod topo;
pub mod trace;

#[cfg(test)]
mod test;
