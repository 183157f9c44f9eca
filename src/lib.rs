pub mod shared {
    pub mod core {
        pub mod primitives;
    }
    pub mod infrastructure {
        pub mod detached;
        pub mod entity_locks;
        pub mod error_reporter;
        pub mod event_channel;
        pub mod write_through;
    }
}

pub mod modules {
    pub mod members {
        pub mod core {
            pub mod events;
            pub mod experience;
            pub mod member;
            pub mod ports;
        }
        pub mod use_cases {
            pub mod services;
            pub mod message_received {
                pub mod handler;
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod voice_state_changed {
                pub mod handler;
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod lifecycle {
                pub mod handler;
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod member_commands {
                pub mod handler;
                pub mod inbound {
                    pub mod http;
                }
            }
            pub mod get_member {
                pub mod inbound {
                    pub mod http;
                }
            }
        }
        pub mod adapters {
            pub mod outbound {
                pub mod tracing_notifier;
            }
        }
    }
}

pub mod shell;
