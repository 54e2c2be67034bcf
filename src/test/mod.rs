mod aodv_discovery;
mod backoff;
mod mac_handshake;
mod mac_queue;
mod routing_table;
mod sim_time;
mod topologies;
mod transfer;
