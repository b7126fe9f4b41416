use std::fmt;

use super::state::OperationFlags;

/// Every asynchronous action the profile store performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LoadProfile,
    UploadPhoto,
    SetMainPhoto,
    DeletePhoto,
    EditProfile,
    UpdateProfile,
    Follow,
    Unfollow,
    LoadActivities,
    LoadFollowings,
}

impl Operation {
    /// User-facing failure message.
    pub fn failure_notice(&self) -> &'static str {
        match self {
            Operation::LoadProfile => "Problem loading profile",
            Operation::UploadPhoto => "Problem uploading photo",
            Operation::SetMainPhoto => "Problem setting photo as main",
            Operation::DeletePhoto => "Problem deleting photo",
            Operation::EditProfile => "Problem submitting data",
            Operation::UpdateProfile => "Problem updating profile",
            Operation::Follow => "Problems following user",
            Operation::Unfollow => "Problems unfollowing user",
            Operation::LoadActivities => "Problems loading activities",
            Operation::LoadFollowings => "Problems loading followings",
        }
    }

    /// The in-flight flag this operation owns.
    pub(crate) fn flag_mut<'a>(&self, flags: &'a mut OperationFlags) -> &'a mut bool {
        match self {
            Operation::LoadProfile => &mut flags.loading_profile,
            Operation::UploadPhoto => &mut flags.uploading_photo,
            Operation::SetMainPhoto
            | Operation::DeletePhoto
            | Operation::Follow
            | Operation::Unfollow => &mut flags.loading,
            Operation::EditProfile => &mut flags.submitting,
            Operation::UpdateProfile => &mut flags.updating_profile,
            Operation::LoadActivities => &mut flags.loading_activities,
            Operation::LoadFollowings => &mut flags.loading_followings,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::LoadProfile => "load_profile",
            Operation::UploadPhoto => "upload_photo",
            Operation::SetMainPhoto => "set_main_photo",
            Operation::DeletePhoto => "delete_photo",
            Operation::EditProfile => "edit_profile",
            Operation::UpdateProfile => "update_profile",
            Operation::Follow => "follow",
            Operation::Unfollow => "unfollow",
            Operation::LoadActivities => "load_activities",
            Operation::LoadFollowings => "load_followings",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
