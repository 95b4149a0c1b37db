pub mod game;

pub use game::{
    ApiResponse, CreateRoomRequest, CreateRoomResponse, JoinResponse, NextRoundRequest,
    NextRoundResponse, Player, Room, RoomActionRequest, RoomStateResponse, RoomStatus, Round,
    RoundView, StartResponse, SubmitRequest, SubmitResponse,
};
