//! Remote peers in the room, one avatar each.

use std::collections::{BTreeMap, HashMap};

use glam::{Quat, Vec3, Vec4};
use roomlink::{ClientId, Player};
use tracing::{debug, info};

use crate::surface::{AvatarHandle, RenderSurface};

#[derive(Debug, Clone, PartialEq)]
pub struct RemotePeer {
    pub name: String,
    pub avatar: AvatarHandle,
    pub position: Vec3,
    pub rotation: Quat,
    pub desired_position: Vec3,
    pub desired_rotation: Quat,
}

/// What a roster pass did, by peer id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
}

#[derive(Debug, Default)]
pub struct PresenceManager {
    peers: BTreeMap<String, RemotePeer>,
}

impl PresenceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peer(&self, id: &str) -> Option<&RemotePeer> {
        self.peers.get(id)
    }

    pub fn peers(&self) -> impl Iterator<Item = (&String, &RemotePeer)> {
        self.peers.iter()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Mark-and-sweep the roster against the avatars we have. Known peers
    /// only get new pose targets; peers missing from the roster are torn
    /// down label first.
    pub fn reconcile(
        &mut self,
        players: &HashMap<String, Option<Player>>,
        local: Option<&ClientId>,
        surface: &mut dyn RenderSurface,
    ) -> PresenceReport {
        let mut report = PresenceReport::default();
        let mut seen: BTreeMap<String, bool> =
            self.peers.keys().map(|id| (id.clone(), false)).collect();

        let mut ids: Vec<&String> = players.keys().collect();
        ids.sort();

        let mut spawned = Vec::new();
        for id in ids {
            if local.is_some_and(|local| local.as_str() == id) {
                continue;
            }
            // mid-join on the server
            let Some(player) = players.get(id).and_then(Option::as_ref) else {
                continue;
            };
            let position = Vec3::from(player.position);
            let rotation = Quat::from(player.rotation);

            match self.peers.get_mut(id) {
                Some(peer) => {
                    peer.desired_position = position;
                    peer.desired_rotation = rotation;
                    seen.insert(id.clone(), true);
                    report.updated.push(id.clone());
                }
                None => {
                    info!("{} ({id}) joined", player.name);
                    let avatar = surface.spawn_avatar(&player.name, position, rotation);
                    spawned.push((
                        id.clone(),
                        RemotePeer {
                            name: player.name.clone(),
                            avatar,
                            position,
                            rotation,
                            desired_position: position,
                            desired_rotation: rotation,
                        },
                    ));
                    report.created.push(id.clone());
                }
            }
        }

        let gone: Vec<String> = seen
            .into_iter()
            .filter(|(_, updated)| !updated)
            .map(|(id, _)| id)
            .collect();

        for id in gone {
            let Some(peer) = self.peers.remove(&id) else {
                continue;
            };
            info!("{} ({id}) left", peer.name);
            surface.detach_label(&peer.avatar);
            surface.remove_avatar(peer.avatar);
            report.removed.push(id);
        }

        self.peers.extend(spawned);
        report
    }

    /// Ease every avatar toward its latest target. Position and rotation are
    /// smoothed per component, which is close enough to a slerp for the small
    /// deltas between room ticks.
    pub fn interpolate(&mut self, dt: f32, surface: &mut dyn RenderSurface) {
        let t = (dt * 2.0).clamp(0.0, 1.0);
        for peer in self.peers.values_mut() {
            peer.position += (peer.desired_position - peer.position) * t;

            let current = Vec4::from(peer.rotation);
            let desired = Vec4::from(peer.desired_rotation);
            peer.rotation = Quat::from_vec4(current + (desired - current) * t);

            surface.set_avatar_pose(&peer.avatar, peer.position, peer.rotation);
        }
    }

    /// Remove every avatar, e.g. when the socket goes away.
    pub fn clear(&mut self, surface: &mut dyn RenderSurface) {
        for (id, peer) in std::mem::take(&mut self.peers) {
            debug!("clearing avatar for {id}");
            surface.detach_label(&peer.avatar);
            surface.remove_avatar(peer.avatar);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RecordingSurface, SurfaceCall};
    use pretty_assertions::assert_eq;
    use roomlink::{Quaternion, Vector3};

    fn player(name: &str, x: f32) -> Option<Player> {
        Some(Player {
            name: name.to_owned(),
            position: Vector3 { x, y: 0.0, z: 0.0 },
            rotation: Quaternion::default(),
        })
    }

    fn roster(entries: &[(&str, Option<Player>)]) -> HashMap<String, Option<Player>> {
        entries
            .iter()
            .map(|(id, p)| ((*id).to_owned(), p.clone()))
            .collect()
    }

    #[test]
    fn roster_changes_create_update_and_remove() {
        let mut surface = RecordingSurface::default();
        let mut presence = PresenceManager::new();

        let first = presence.reconcile(
            &roster(&[("A", player("alice", 1.0)), ("B", player("bob", 2.0))]),
            None,
            &mut surface,
        );
        assert_eq!(first.created, vec!["A", "B"]);
        let alice = presence.peer("A").unwrap().avatar;
        let bob_before = presence.peer("B").unwrap().clone();

        let second = presence.reconcile(
            &roster(&[("B", player("bob", 5.0)), ("C", player("carol", 3.0))]),
            None,
            &mut surface,
        );
        assert_eq!(
            second,
            PresenceReport {
                created: vec!["C".to_owned()],
                updated: vec!["B".to_owned()],
                removed: vec!["A".to_owned()],
            }
        );

        // B keeps its avatar and current pose, only the target moves
        let bob = presence.peer("B").unwrap();
        assert_eq!(bob.avatar, bob_before.avatar);
        assert_eq!(bob.position, bob_before.position);
        assert_eq!(bob.desired_position, Vec3::new(5.0, 0.0, 0.0));

        let detach = surface
            .calls
            .iter()
            .position(|c| *c == SurfaceCall::DetachLabel(alice.label))
            .unwrap();
        let remove = surface
            .calls
            .iter()
            .position(|c| *c == SurfaceCall::RemoveAvatar(alice.object))
            .unwrap();
        assert!(detach < remove);
        assert_eq!(surface.avatars.len(), 2);
    }

    #[test]
    fn same_roster_twice_is_idempotent() {
        let mut surface = RecordingSurface::default();
        let mut presence = PresenceManager::new();
        let players = roster(&[("A", player("alice", 1.0))]);

        presence.reconcile(&players, None, &mut surface);
        let again = presence.reconcile(&players, None, &mut surface);

        assert!(again.created.is_empty());
        assert!(again.removed.is_empty());
        assert_eq!(presence.len(), 1);
        assert_eq!(surface.avatars.len(), 1);
    }

    #[test]
    fn self_and_null_entries_are_skipped() {
        let mut surface = RecordingSurface::default();
        let mut presence = PresenceManager::new();
        let me = ClientId::new("me");

        let report = presence.reconcile(
            &roster(&[("me", player("me", 0.0)), ("joining", None), ("A", player("alice", 1.0))]),
            Some(&me),
            &mut surface,
        );

        assert_eq!(report.created, vec!["A"]);
        assert!(presence.peer("me").is_none());
        assert!(presence.peer("joining").is_none());
    }

    #[test]
    fn interpolation_converges_without_overshoot() {
        let mut surface = RecordingSurface::default();
        let mut presence = PresenceManager::new();
        presence.reconcile(&roster(&[("A", player("alice", 0.0))]), None, &mut surface);
        presence.reconcile(&roster(&[("A", player("alice", 10.0))]), None, &mut surface);

        let mut last = 0.0;
        for _ in 0..100 {
            presence.interpolate(0.1, &mut surface);
            let x = presence.peer("A").unwrap().position.x;
            assert!(x >= last, "moved backwards: {x} < {last}");
            assert!(x <= 10.0, "overshot: {x}");
            last = x;
        }
        assert!((10.0 - last).abs() < 1e-3);
    }

    #[test]
    fn large_frame_gaps_do_not_overshoot() {
        let mut surface = RecordingSurface::default();
        let mut presence = PresenceManager::new();
        presence.reconcile(&roster(&[("A", player("alice", 0.0))]), None, &mut surface);
        presence.reconcile(&roster(&[("A", player("alice", 4.0))]), None, &mut surface);

        presence.interpolate(2.0, &mut surface);
        assert_eq!(presence.peer("A").unwrap().position.x, 4.0);
    }
}
