pub mod nodes;

#[macro_use]
pub mod macros {
    #[macro_export]
    macro_rules! pin_box {
        ($e: expr) => {
            Box::new(
                move |ctx: $crate::core::CommandContext| -> $crate::commands::meta::nodes::CommandResultOuter {
                    Box::pin($e(ctx))
                },
            )
        };
    }

    #[macro_export]
    macro_rules! command {
        ($name: literal, $e: expr, $bot_permissions: expr, $author_permissions: expr, $guild_only: expr, $usage: literal, $help: literal) => {
            ::std::sync::Arc::new($crate::commands::meta::nodes::CommandNode {
                name: String::from($name),
                handler: Some($crate::pin_box!($e)),
                sub_nodes: ::std::collections::HashMap::new(),
                node_list: vec![],
                bot_permissions: $bot_permissions,
                author_permissions: $author_permissions,
                guild_only: $guild_only,
                usage: $usage,
                help: $help,
            })
        };
    }

    #[macro_export]
    macro_rules! command_with_subcommands_and_handler {
        ($name: literal, $e: expr, $usage: literal, $help: literal, $($node: expr),*) => {
        {
        let mut map = ::std::collections::HashMap::new();
        let mut list = vec![];
         $(
         let node = $node;
         if map.contains_key(&node.name) {
            panic!("Tried to register subcommand name {} but a subcommand is already registered under this name", &node.name)
         }
         map.insert(node.name.clone(), node.clone());
         list.push(node);
         )*
        ::std::sync::Arc::new($crate::commands::meta::nodes::CommandNode {
                name: String::from($name),
                handler: Some($crate::pin_box!($e)),
                sub_nodes: map,
                node_list: list,
                bot_permissions: twilight_model::guild::Permissions::empty(),
                author_permissions: twilight_model::guild::Permissions::empty(),
                guild_only: false,
                usage: $usage,
                help: $help,
            })
        }
        }
    }
}
