use std::collections::HashMap;

use twilight_http::Client as HttpClient;
use twilight_model::channel::permission_overwrite::{PermissionOverwrite, PermissionOverwriteType};
use twilight_model::channel::{Channel, GuildChannel};
use twilight_model::guild::Permissions;
use twilight_model::id::{ChannelId, GuildId, RoleId, UserId};

use crate::error::TransportError;

/// What's needed to work out someone's permissions in a guild channel.
pub struct PermissionData<'a> {
    pub guild_id: GuildId,
    pub owner_id: UserId,
    pub user_id: UserId,
    pub roles: &'a HashMap<RoleId, Permissions>,
    pub member_roles: &'a [RoleId],
    pub overwrites: &'a [PermissionOverwrite],
}

/// What a DM channel allows, there are no overwrites or roles there.
pub fn dm_permissions() -> Permissions {
    Permissions::SEND_MESSAGES
        | Permissions::EMBED_LINKS
        | Permissions::ATTACH_FILES
        | Permissions::USE_EXTERNAL_EMOJIS
        | Permissions::ADD_REACTIONS
        | Permissions::READ_MESSAGE_HISTORY
}

pub fn channel_permissions(data: &PermissionData<'_>) -> Permissions {
    if data.user_id == data.owner_id {
        return Permissions::all();
    }

    // the @everyone role shares its id with the guild
    let everyone = RoleId(data.guild_id.0);
    let mut permissions = data.roles.get(&everyone).copied().unwrap_or_else(Permissions::empty);
    for role_id in data.member_roles {
        if let Some(role_permissions) = data.roles.get(role_id) {
            permissions |= *role_permissions;
        }
    }

    //admins don't give a **** about overrides
    if permissions.contains(Permissions::ADMINISTRATOR) {
        return Permissions::all();
    }

    let mut everyone_allowed = Permissions::empty();
    let mut everyone_denied = Permissions::empty();
    let mut user_allowed = Permissions::empty();
    let mut user_denied = Permissions::empty();
    let mut role_allowed = Permissions::empty();
    let mut role_denied = Permissions::empty();
    for o in data.overwrites {
        match o.kind {
            PermissionOverwriteType::Member(member_id) => {
                if member_id == data.user_id {
                    user_allowed |= o.allow;
                    user_denied |= o.deny;
                }
            }
            PermissionOverwriteType::Role(role_id) => {
                if role_id == everyone {
                    everyone_allowed |= o.allow;
                    everyone_denied |= o.deny
                } else if data.member_roles.contains(&role_id) {
                    role_allowed |= o.allow;
                    role_denied |= o.deny;
                }
            }
        }
    }

    permissions &= !everyone_denied;
    permissions |= everyone_allowed;

    permissions &= !role_denied;
    permissions |= role_allowed;

    permissions &= !user_denied;
    permissions |= user_allowed;

    permissions
}

/// Fetches everything needed from the api and calculates the permissions of `user_id` in `channel_id`.
///
/// Users that aren't (or no longer are) in the guild end up without any permissions.
pub async fn fetch_channel_permissions(
    http: &HttpClient,
    guild_id: GuildId,
    channel_id: ChannelId,
    user_id: UserId,
) -> Result<Permissions, TransportError> {
    let guild = match http.guild(guild_id).await? {
        Some(guild) => guild,
        None => return Ok(Permissions::empty()),
    };
    let member = match http.guild_member(guild_id, user_id).await? {
        Some(member) => member,
        None => return Ok(Permissions::empty()),
    };
    let overwrites = match http.channel(channel_id).await? {
        Some(Channel::Guild(GuildChannel::Text(channel))) => channel.permission_overwrites,
        Some(Channel::Guild(GuildChannel::Voice(channel))) => channel.permission_overwrites,
        Some(Channel::Guild(GuildChannel::Category(channel))) => channel.permission_overwrites,
        Some(_) => vec![],
        None => return Err(TransportError::NotFound),
    };
    let roles = http
        .roles(guild_id)
        .await?
        .into_iter()
        .map(|role| (role.id, role.permissions))
        .collect::<HashMap<_, _>>();

    Ok(channel_permissions(&PermissionData {
        guild_id,
        owner_id: guild.owner_id,
        user_id,
        roles: &roles,
        member_roles: &member.roles,
        overwrites: &overwrites,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: GuildId = GuildId(10);
    const OWNER: UserId = UserId(1);
    const USER: UserId = UserId(2);
    const MODS: RoleId = RoleId(20);

    fn roles() -> HashMap<RoleId, Permissions> {
        let mut roles = HashMap::new();
        roles.insert(RoleId(GUILD.0), Permissions::SEND_MESSAGES | Permissions::READ_MESSAGE_HISTORY);
        roles.insert(MODS, Permissions::MANAGE_MESSAGES);
        roles.insert(RoleId(30), Permissions::ADMINISTRATOR);
        roles
    }

    fn overwrite(kind: PermissionOverwriteType, allow: Permissions, deny: Permissions) -> PermissionOverwrite {
        PermissionOverwrite { allow, deny, kind }
    }

    fn calculate(member_roles: &[RoleId], overwrites: &[PermissionOverwrite]) -> Permissions {
        let roles = roles();
        channel_permissions(&PermissionData {
            guild_id: GUILD,
            owner_id: OWNER,
            user_id: USER,
            roles: &roles,
            member_roles,
            overwrites,
        })
    }

    #[test]
    fn roles_add_up() {
        let permissions = calculate(&[MODS], &[]);

        assert!(permissions.contains(Permissions::MANAGE_MESSAGES | Permissions::SEND_MESSAGES));
        assert!(!calculate(&[], &[]).contains(Permissions::MANAGE_MESSAGES));
    }

    #[test]
    fn overwrites_apply_everyone_then_roles_then_members() {
        let overwrites = vec![
            overwrite(
                PermissionOverwriteType::Role(RoleId(GUILD.0)),
                Permissions::MANAGE_MESSAGES,
                Permissions::SEND_MESSAGES,
            ),
            overwrite(
                PermissionOverwriteType::Role(MODS),
                Permissions::SEND_MESSAGES,
                Permissions::MANAGE_MESSAGES,
            ),
            overwrite(
                PermissionOverwriteType::Member(USER),
                Permissions::MANAGE_MESSAGES,
                Permissions::empty(),
            ),
        ];

        // everyone allows manage messages, which the member overwrite keeps
        assert!(calculate(&[], &overwrites[..1]).contains(Permissions::MANAGE_MESSAGES));
        assert!(!calculate(&[], &overwrites[..1]).contains(Permissions::SEND_MESSAGES));
        // the mod role overwrite beats the everyone overwrite
        let mods = calculate(&[MODS], &overwrites[..2]);
        assert!(!mods.contains(Permissions::MANAGE_MESSAGES));
        assert!(mods.contains(Permissions::SEND_MESSAGES));
        // and the member overwrite beats both
        assert!(calculate(&[MODS], &overwrites).contains(Permissions::MANAGE_MESSAGES));
    }

    #[test]
    fn overwrites_for_others_are_ignored() {
        let overwrites = vec![overwrite(
            PermissionOverwriteType::Member(UserId(99)),
            Permissions::empty(),
            Permissions::MANAGE_MESSAGES,
        )];

        assert!(calculate(&[MODS], &overwrites).contains(Permissions::MANAGE_MESSAGES));
    }

    #[test]
    fn administrators_and_owners_skip_overwrites() {
        let overwrites = vec![overwrite(
            PermissionOverwriteType::Member(USER),
            Permissions::empty(),
            Permissions::MANAGE_MESSAGES,
        )];

        assert_eq!(calculate(&[RoleId(30)], &overwrites), Permissions::all());

        let roles = roles();
        let owner = channel_permissions(&PermissionData {
            guild_id: GUILD,
            owner_id: OWNER,
            user_id: OWNER,
            roles: &roles,
            member_roles: &[],
            overwrites: &overwrites,
        });
        assert_eq!(owner, Permissions::all());
    }

    #[test]
    fn dms_never_allow_managing_messages() {
        assert!(!dm_permissions().contains(Permissions::MANAGE_MESSAGES));
    }
}
