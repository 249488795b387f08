mod dispatcher;
mod helpers;
mod host_channel;
