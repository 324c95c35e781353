use log::{info, warn};
use twilight_gateway::Event;

use crate::{sweeper_important, sweeper_warn};

pub fn handle_event(shard_id: u64, event: &Event) {
    match &event {
        Event::ShardConnecting(_) => info!("Shard {} is connecting", shard_id),
        Event::ShardConnected(_) => sweeper_important!("Shard {} has connected", shard_id),
        Event::ShardDisconnected(_) => sweeper_warn!("Shard {} has disconnected", shard_id),
        Event::ShardReconnecting(_) => info!("Shard {} is attempting to reconnect", shard_id),
        Event::ShardResuming(_) => info!("Shard {} is resuming", shard_id),
        Event::Ready(ready) => sweeper_important!("Connected to the gateway on shard {} as {}", shard_id, ready.user.name),
        Event::GatewayInvalidateSession(recon) => {
            if *recon {
                warn!("The gateway has invalidated our session, but it is reconnectable!");
            } else {
                sweeper_warn!("The gateway invalidated the session of shard {}", shard_id);
            }
        }
        Event::GatewayReconnect => info!("We reconnected to the gateway!"),
        Event::GatewayHello(u) => info!("Registered with gateway {}", u),
        _ => (),
    }
}
